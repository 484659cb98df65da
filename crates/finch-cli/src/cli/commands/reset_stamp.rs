//! `finch reset-stamp` – delete the seed stamp.

use anyhow::Result;

use super::Context;

pub fn run_reset_stamp(ctx: &Context) -> Result<()> {
    ctx.stamp.remove()?;
    println!("Removed stamp {}.", ctx.stamp.path().display());
    Ok(())
}
