//! Activation inputs and results.

use crate::state_db::{JobExtras, JobId, MetricsPrefs};

use super::outcome::FetchOutcome;
use super::SEED_FETCH_JOB_ID;

/// What the platform hands to `on_start`: the job id and its extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParameters {
    pub job_id: JobId,
    pub extras: JobExtras,
}

impl JobParameters {
    pub fn new(job_id: JobId, extras: JobExtras) -> Self {
        Self { job_id, extras }
    }
}

impl Default for JobParameters {
    fn default() -> Self {
        Self::new(SEED_FETCH_JOB_ID, JobExtras::default())
    }
}

/// The request environment is incomplete; the activation cannot proceed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestConfigError {
    #[error("milestone is not configured")]
    MissingMilestone,
    #[error("channel is not configured")]
    MissingChannel,
}

/// What happened during one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The downloader was called and returned (or failed with) `result_code`.
    Completed {
        result_code: i64,
        outcome: FetchOutcome,
    },
    /// Nothing was fetched: the request environment is incomplete.
    ConfigurationInvalid(RequestConfigError),
}

/// Job completion signal: the parameters (with updated extras) and whether the
/// platform should run the job again with backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFinished {
    pub params: JobParameters,
    pub needs_reschedule: bool,
    pub activation: Activation,
    /// Metrics this activation committed; None when nothing was committed.
    pub metrics: Option<MetricsPrefs>,
}
