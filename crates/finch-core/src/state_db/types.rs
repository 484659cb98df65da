//! Types stored in the state database.

use serde::{Deserialize, Serialize};

/// Platform job identifier.
pub type JobId = i64;

pub const PREF_SEED_FETCH_RESULT: &str = "variations_seed_fetch_result";
pub const PREF_SEED_FETCH_TIME: &str = "variations_seed_fetch_time";
pub const PREF_LAST_JOB_START_TIME: &str = "variations_last_job_start_time";
pub const PREF_LAST_ENQUEUE_TIME: &str = "variations_last_enqueue_time";
pub const PREF_JOB_INTERVAL: &str = "variations_job_interval";
pub const PREF_JOB_QUEUE_TIME: &str = "variations_job_queue_time";

/// Every key `MetricsPrefs` reads and writes.
pub const METRICS_PREF_KEYS: [&str; 6] = [
    PREF_SEED_FETCH_RESULT,
    PREF_SEED_FETCH_TIME,
    PREF_LAST_JOB_START_TIME,
    PREF_LAST_ENQUEUE_TIME,
    PREF_JOB_INTERVAL,
    PREF_JOB_QUEUE_TIME,
];

/// Scheduler metrics kept between job runs. Times are epoch millis, durations millis.
/// `None` means unset, which is distinct from zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsPrefs {
    pub seed_fetch_result: Option<i64>,
    pub seed_fetch_time: Option<i64>,
    pub last_job_start_time: Option<i64>,
    pub last_enqueue_time: Option<i64>,
    pub job_interval: Option<i64>,
    pub job_queue_time: Option<i64>,
}

impl MetricsPrefs {
    /// (key, value) pairs in `METRICS_PREF_KEYS` order.
    pub fn entries(&self) -> [(&'static str, Option<i64>); 6] {
        [
            (PREF_SEED_FETCH_RESULT, self.seed_fetch_result),
            (PREF_SEED_FETCH_TIME, self.seed_fetch_time),
            (PREF_LAST_JOB_START_TIME, self.last_job_start_time),
            (PREF_LAST_ENQUEUE_TIME, self.last_enqueue_time),
            (PREF_JOB_INTERVAL, self.job_interval),
            (PREF_JOB_QUEUE_TIME, self.job_queue_time),
        ]
    }

    /// Set a field by its stored key. Returns false for keys this type doesn't own.
    pub fn set(&mut self, key: &str, value: Option<i64>) -> bool {
        let slot = match key {
            PREF_SEED_FETCH_RESULT => &mut self.seed_fetch_result,
            PREF_SEED_FETCH_TIME => &mut self.seed_fetch_time,
            PREF_LAST_JOB_START_TIME => &mut self.last_job_start_time,
            PREF_LAST_ENQUEUE_TIME => &mut self.last_enqueue_time,
            PREF_JOB_INTERVAL => &mut self.job_interval,
            PREF_JOB_QUEUE_TIME => &mut self.job_queue_time,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_none())
    }
}

/// Network requirement of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    None,
    Any,
    Unmetered,
}

impl NetworkType {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkType::None => "none",
            NetworkType::Any => "any",
            NetworkType::Unmetered => "unmetered",
        }
    }

    /// Inverse of `as_str`. Unknown values read back as `Any`.
    pub fn parse_stored(s: &str) -> Self {
        match s {
            "none" => NetworkType::None,
            "unmetered" => NetworkType::Unmetered,
            _ => NetworkType::Any,
        }
    }
}

/// Extras bundle carried by a job descriptor, stored as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobExtras {
    /// Failed attempts so far in this retry chain.
    #[serde(rename = "RequestCount", default)]
    pub request_count: u32,
}

/// A pending job as held by the platform scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub job_id: JobId,
    pub network: NetworkType,
    pub requires_charging: bool,
    pub extras: JobExtras,
    /// Earliest activation time (epoch millis); None = as soon as conditions hold.
    pub not_before: Option<i64>,
    /// Assigned by the platform on each `schedule`; a replaced descriptor gets a new value.
    pub generation: i64,
    /// Assigned by the platform: when the descriptor was submitted.
    pub scheduled_at: i64,
}

impl JobDescriptor {
    /// Descriptor with the seed-fetch constraints: any network, charging required.
    pub fn new(job_id: JobId, extras: JobExtras) -> Self {
        Self {
            job_id,
            network: NetworkType::Any,
            requires_charging: true,
            extras,
            not_before: None,
            generation: 0,
            scheduled_at: 0,
        }
    }

    pub fn with_not_before(mut self, at_millis: i64) -> Self {
        self.not_before = Some(at_millis);
        self
    }

    /// True if the descriptor may be activated at `now`.
    pub fn is_ready(&self, now: i64) -> bool {
        self.not_before.map_or(true, |t| t <= now)
    }
}
