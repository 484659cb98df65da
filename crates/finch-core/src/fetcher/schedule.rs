//! Check-and-enqueue: decide whether the fetch job needs to be scheduled.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::clock::elapsed_millis;
use crate::config::FetcherSettings;
use crate::state_db::{JobDescriptor, JobExtras};

use super::{SeedFetcher, SEED_FETCH_JOB_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueReason {
    /// `ignore-pending-download` is set; any pending descriptor is replaced.
    IgnorePending,
    /// The seed has never been fetched.
    NoStamp,
    /// The minimum download period is overridden to zero.
    PeriodDisabled,
    /// The last successful fetch is older than the minimum period.
    StampExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyPending,
    StampFresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    Enqueue(EnqueueReason),
    Skip(SkipReason),
}

impl ScheduleDecision {
    pub fn is_enqueue(self) -> bool {
        matches!(self, ScheduleDecision::Enqueue(_))
    }
}

/// The scheduling decision table; first matching row wins.
pub fn decide_schedule(
    settings: &FetcherSettings,
    has_pending: bool,
    stamp_millis: Option<i64>,
    now: i64,
) -> ScheduleDecision {
    if settings.ignore_pending_download {
        return ScheduleDecision::Enqueue(EnqueueReason::IgnorePending);
    }
    if has_pending {
        return ScheduleDecision::Skip(SkipReason::AlreadyPending);
    }
    let Some(stamp) = stamp_millis else {
        return ScheduleDecision::Enqueue(EnqueueReason::NoStamp);
    };
    if settings.min_download_period == Duration::ZERO {
        return ScheduleDecision::Enqueue(EnqueueReason::PeriodDisabled);
    }
    let age = elapsed_millis(stamp, now) as u128;
    if age < settings.min_download_period.as_millis() {
        return ScheduleDecision::Skip(SkipReason::StampFresh);
    }
    ScheduleDecision::Enqueue(EnqueueReason::StampExpired)
}

impl SeedFetcher {
    /// Enqueue the fetch job unless one is pending or the last fetch is recent enough.
    /// Safe to call concurrently; the check and the enqueue happen under one lock.
    pub async fn schedule_if_needed(&self) -> Result<ScheduleDecision> {
        let _guard = self.schedule_lock.lock().await;

        let now = self.clock.now_millis();
        let has_pending = self
            .scheduler
            .get_pending(SEED_FETCH_JOB_ID)
            .await
            .context("query pending fetch job")?
            .is_some();
        let stamp_millis = match self.stamp.modified_millis() {
            Ok(t) => t,
            Err(e) => {
                // Unreadable stamp is treated as absent.
                tracing::warn!(path = %self.stamp.path().display(), "read stamp: {}", e);
                None
            }
        };

        let decision = decide_schedule(&self.settings, has_pending, stamp_millis, now);
        let ScheduleDecision::Enqueue(reason) = decision else {
            tracing::debug!(?decision, "seed fetch job not scheduled");
            return Ok(decision);
        };

        if let Err(e) = self.db.set_last_enqueue_time(now).await {
            tracing::warn!("record enqueue time: {:#}", e);
        }
        let desc = self
            .scheduler
            .schedule(JobDescriptor::new(SEED_FETCH_JOB_ID, JobExtras::default()))
            .await
            .context("schedule seed fetch job")?;
        tracing::info!(
            job_id = desc.job_id,
            generation = desc.generation,
            ?reason,
            "seed fetch job scheduled"
        );
        Ok(decision)
    }
}
