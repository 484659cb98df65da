//! `finch cancel` – drop the pending fetch job and stop a running activation.

use anyhow::Result;
use finch_core::fetcher::SEED_FETCH_JOB_ID;
use finch_core::platform::JobScheduler;

use super::Context;
use crate::cli::bridge_socket;

pub async fn run_cancel(ctx: &Context) -> Result<()> {
    let removed = ctx.scheduler.cancel(SEED_FETCH_JOB_ID).await?;
    let stopped = match bridge_socket::send_stop(&ctx.socket_path()).await {
        Ok(stopped) => stopped,
        Err(e) => {
            tracing::debug!("stop request not delivered: {:#}", e);
            false
        }
    };
    match (removed, stopped) {
        (false, false) => println!("No seed fetch job to cancel."),
        (true, false) => println!("Cancelled pending seed fetch job."),
        (_, true) => println!("Stopped running seed fetch job."),
    }
    Ok(())
}
