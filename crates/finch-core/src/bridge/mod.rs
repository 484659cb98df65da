//! Metrics bridge: a durable append-only store of metric records.
//!
//! Producers post opaque frames with `record`; a consumer drains them with
//! `retrieve`. Frames survive restarts in a file of varint-delimited records,
//! and the bridge reports on itself with a few self-metrics.

pub mod frame;
pub mod histogram;
pub mod records_file;
mod service;


use std::path::{Path, PathBuf};

pub use frame::{read_delimited, write_delimited, FrameError};
pub use histogram::{
    HistogramRecord, ParsingLogResult, RecordType, RetrieveMetricsTaskStatus,
    DROPPED_RECORDS_HISTOGRAM, PARSING_LOG_RESULT_HISTOGRAM, RETRIEVE_STATUS_HISTOGRAM,
};
pub use service::MetricsBridge;

pub const RECORDS_FILE_NAME: &str = "metrics_bridge_records";
pub const BRIDGE_SOCKET_NAME: &str = "bridge.sock";

pub fn records_path(state_dir: &Path) -> PathBuf {
    state_dir.join(RECORDS_FILE_NAME)
}

pub fn socket_path(state_dir: &Path) -> PathBuf {
    state_dir.join(BRIDGE_SOCKET_NAME)
}
