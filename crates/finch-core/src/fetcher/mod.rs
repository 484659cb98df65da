//! Background variations seed fetch scheduler.
//!
//! `schedule_if_needed` decides whether to enqueue the periodic fetch job with
//! the platform scheduler; `on_start` runs one activation: download, metrics,
//! stamp, and the retry decision.
//!
//! Per job chain: IDLE -> PENDING (enqueued) -> RUNNING (activated) -> IDLE on
//! success, permanent failure or exhausted retries, or back to PENDING with
//! `request_count + 1` on a transient failure.

mod metrics;
mod outcome;
mod run;
mod schedule;
mod types;

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::FetcherSettings;
use crate::downloader::Downloader;
use crate::platform::JobScheduler;
use crate::stamp::SeedStamp;
use crate::state_db::{JobId, StateDb};

pub use metrics::{begin_job_metrics, records_from_prefs};
pub use outcome::{FetchOutcome, TRANSPORT_FAILURE_CODE};
pub use run::seed_request;
pub use schedule::{decide_schedule, EnqueueReason, ScheduleDecision, SkipReason};
pub use types::{Activation, JobFinished, JobParameters, RequestConfigError};

/// Stable platform job id of the seed fetch job.
pub const SEED_FETCH_JOB_ID: JobId = 83;

/// Extras key carrying the failed-attempt count.
pub const REQUEST_COUNT_KEY: &str = "RequestCount";

/// Schedules and runs seed fetches. Cheap to share behind an `Arc`.
pub struct SeedFetcher {
    settings: FetcherSettings,
    db: StateDb,
    stamp: SeedStamp,
    scheduler: Arc<dyn JobScheduler>,
    downloader: Arc<dyn Downloader>,
    clock: Arc<dyn Clock>,
    /// Serializes check-then-enqueue across concurrent `schedule_if_needed` callers.
    schedule_lock: tokio::sync::Mutex<()>,
}

impl SeedFetcher {
    pub fn new(
        settings: FetcherSettings,
        db: StateDb,
        stamp: SeedStamp,
        scheduler: Arc<dyn JobScheduler>,
        downloader: Arc<dyn Downloader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            db,
            stamp,
            scheduler,
            downloader,
            clock,
            schedule_lock: tokio::sync::Mutex::new(()),
        }
    }
}
