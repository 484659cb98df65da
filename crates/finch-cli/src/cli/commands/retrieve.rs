//! `finch retrieve` – drain the metrics bridge and print one line per record.

use anyhow::Result;
use finch_core::bridge::{HistogramRecord, MetricsBridge};
use std::fmt::Write as _;

use super::Context;
use crate::cli::bridge_socket;

fn describe(frame: &[u8]) -> String {
    match HistogramRecord::decode(frame) {
        Ok(record) => record.to_string(),
        Err(_) => {
            let mut out = format!("raw {} bytes: ", frame.len());
            for b in frame.iter().take(32) {
                let _ = write!(out, "{:02x}", b);
            }
            if frame.len() > 32 {
                out.push_str("..");
            }
            out
        }
    }
}

pub async fn run_retrieve(ctx: &Context) -> Result<()> {
    let socket_path = ctx.socket_path();
    let mut frames = None;
    if socket_path.exists() {
        match bridge_socket::send_drain(&socket_path).await {
            Ok(f) => frames = Some(f),
            Err(e) => tracing::debug!("bridge socket unavailable, reading locally: {:#}", e),
        }
    }
    let frames = match frames {
        Some(f) => f,
        None => MetricsBridge::start(ctx.records_path())?.retrieve().await,
    };

    for frame in &frames {
        println!("{}", describe(frame));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::describe;
    use finch_core::bridge::HistogramRecord;

    #[test]
    fn describes_records_and_raw_frames() {
        let r = HistogramRecord::sparse("Variations.WebViewDownloadJobFetchResult", 404);
        assert_eq!(
            describe(&r.encode()),
            "sparse Variations.WebViewDownloadJobFetchResult sample=404"
        );
        assert_eq!(describe(&[0xff, 0x01]), "raw 2 bytes: ff01");
    }
}
