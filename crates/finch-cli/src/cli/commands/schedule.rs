//! `finch schedule` – enqueue the seed fetch job if it is due.

use anyhow::Result;
use finch_core::fetcher::ScheduleDecision;

use super::Context;

pub async fn run_schedule(ctx: &Context) -> Result<()> {
    match ctx.fetcher().schedule_if_needed().await? {
        ScheduleDecision::Enqueue(reason) => println!("Seed fetch job scheduled ({:?}).", reason),
        ScheduleDecision::Skip(reason) => println!("Seed fetch job not scheduled ({:?}).", reason),
    }
    Ok(())
}
