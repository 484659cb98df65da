//! `finch record` – submit one metrics record.

use anyhow::{bail, Context as _, Result};
use finch_core::bridge::MetricsBridge;
use std::path::Path;

use super::Context;
use crate::cli::bridge_socket;

pub async fn run_record(ctx: &Context, path: &Path) -> Result<()> {
    let frame = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    if frame.is_empty() {
        bail!("{} is empty", path.display());
    }
    bridge_socket::ensure_record_fits(&frame)?;

    let socket_path = ctx.socket_path();
    if socket_path.exists() {
        match bridge_socket::send_record(&socket_path, &frame).await {
            Ok(()) => {
                println!("Recorded {} bytes.", frame.len());
                return Ok(());
            }
            Err(e) => tracing::debug!("bridge socket unavailable, writing locally: {:#}", e),
        }
    }

    // No `finch run` is serving the bridge: own the records file for this call.
    let bridge = MetricsBridge::start(ctx.records_path())?;
    let len = frame.len();
    bridge.record(frame);
    bridge.add_task_to_block().await;
    println!("Recorded {} bytes.", len);
    Ok(())
}
