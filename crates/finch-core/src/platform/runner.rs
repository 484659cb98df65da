//! Activation loop standing in for the OS job service.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::MetricsBridge;
use crate::clock::Clock;
use crate::fetcher::{
    records_from_prefs, JobFinished, JobParameters, SeedFetcher, SEED_FETCH_JOB_ID,
};
use crate::state_db::JobDescriptor;

use super::{BackoffPolicy, DeviceConditions, JobControl, JobScheduler};

/// What one `run_once` pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// No descriptor is pending, or its `not_before` is still in the future.
    NotReady,
    /// A descriptor is pending but requires charging.
    NotCharging,
    /// The activation ran to completion.
    Finished {
        finished: JobFinished,
        rescheduled: Option<JobDescriptor>,
    },
    /// The activation was stopped before it completed.
    Stopped { params: JobParameters },
}

pub struct JobRunner {
    fetcher: Arc<SeedFetcher>,
    scheduler: Arc<dyn JobScheduler>,
    conditions: Arc<dyn DeviceConditions>,
    backoff: BackoffPolicy,
    control: Arc<JobControl>,
    clock: Arc<dyn Clock>,
    bridge: Option<MetricsBridge>,
}

impl JobRunner {
    pub fn new(
        fetcher: Arc<SeedFetcher>,
        scheduler: Arc<dyn JobScheduler>,
        conditions: Arc<dyn DeviceConditions>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            scheduler,
            conditions,
            backoff: BackoffPolicy::default(),
            control: Arc::new(JobControl::new()),
            clock,
            bridge: None,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_control(mut self, control: Arc<JobControl>) -> Self {
        self.control = control;
        self
    }

    /// Forward the scheduler's metrics to `bridge` after each completed activation.
    pub fn with_bridge(mut self, bridge: MetricsBridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn control(&self) -> &Arc<JobControl> {
        &self.control
    }

    /// Activate the seed fetch job once if it is ready and conditions hold.
    pub async fn run_once(&self) -> Result<RunResult> {
        let now = self.clock.now_millis();
        let Some(pending) = self
            .scheduler
            .get_pending(SEED_FETCH_JOB_ID)
            .await
            .context("query pending fetch job")?
        else {
            return Ok(RunResult::NotReady);
        };
        if !pending.is_ready(now) {
            return Ok(RunResult::NotReady);
        }
        if pending.requires_charging && !self.conditions.is_charging() {
            tracing::debug!(job_id = pending.job_id, "waiting for charger");
            return Ok(RunResult::NotCharging);
        }
        let Some(desc) = self
            .scheduler
            .take_ready(SEED_FETCH_JOB_ID, now)
            .await
            .context("activate fetch job")?
        else {
            return Ok(RunResult::NotReady);
        };

        tracing::debug!(
            job_id = desc.job_id,
            generation = desc.generation,
            request_count = desc.extras.request_count,
            "activating job"
        );
        let params = JobParameters::new(desc.job_id, desc.extras);
        let stop = self.control.register(desc.job_id);
        let finished = tokio::select! {
            finished = self.fetcher.on_start(Some(params.clone())) => Some(finished),
            _ = stop.notified() => None,
        };
        self.control.unregister(desc.job_id);

        let Some(finished) = finished else {
            if self.fetcher.on_stop(&params) {
                let desc = JobDescriptor::new(params.job_id, params.extras);
                self.scheduler
                    .schedule(desc)
                    .await
                    .context("reschedule stopped job")?;
            }
            return Ok(RunResult::Stopped { params });
        };

        let rescheduled = if finished.needs_reschedule {
            let delay = self.backoff.delay_millis(finished.params.extras.request_count);
            let not_before = self.clock.now_millis().saturating_add(delay);
            let desc = JobDescriptor::new(finished.params.job_id, finished.params.extras)
                .with_not_before(not_before);
            let stored = self
                .scheduler
                .schedule(desc)
                .await
                .context("reschedule seed fetch job")?;
            tracing::info!(
                request_count = stored.extras.request_count,
                delay_ms = delay,
                "seed fetch job rescheduled"
            );
            Some(stored)
        } else {
            None
        };

        self.emit_metrics(&finished);
        Ok(RunResult::Finished {
            finished,
            rescheduled,
        })
    }

    /// Forward the metrics the activation committed, if it committed any.
    fn emit_metrics(&self, finished: &JobFinished) {
        let (Some(bridge), Some(metrics)) = (&self.bridge, &finished.metrics) else {
            return;
        };
        for record in records_from_prefs(metrics) {
            bridge.record(record.encode());
        }
    }

    /// Poll for a ready job every `poll_interval` until `JobControl::shutdown`.
    pub async fn run_until_shutdown(&self, poll_interval: Duration) {
        tracing::info!(poll_secs = poll_interval.as_secs_f64(), "job runner started");
        while !self.control.is_shutting_down() {
            match self.run_once().await {
                Ok(RunResult::Finished { .. }) => continue,
                Ok(RunResult::Stopped { .. }) if self.control.is_shutting_down() => break,
                Ok(_) => {}
                Err(e) => tracing::warn!("job runner pass failed: {:#}", e),
            }
            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                _ = self.control.wait_shutdown() => break,
            }
        }
        tracing::info!("job runner stopped");
    }
}
