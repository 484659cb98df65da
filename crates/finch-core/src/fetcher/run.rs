//! Job activation: fetch the seed, record metrics, update the stamp, decide on retry.

use std::sync::Arc;

use crate::clock::elapsed_millis;
use crate::config::FetcherSettings;
use crate::downloader::{SeedRequest, VariationsPlatform};

use super::metrics::begin_job_metrics;
use super::outcome::{FetchOutcome, TRANSPORT_FAILURE_CODE};
use super::types::{Activation, JobFinished, JobParameters, RequestConfigError};
use super::SeedFetcher;

/// Build the seed request from the configured environment.
pub fn seed_request(settings: &FetcherSettings) -> Result<SeedRequest, RequestConfigError> {
    let milestone = settings
        .milestone
        .filter(|m| *m > 0)
        .ok_or(RequestConfigError::MissingMilestone)?;
    let channel = settings
        .channel
        .clone()
        .filter(|c| !c.trim().is_empty())
        .ok_or(RequestConfigError::MissingChannel)?;
    Ok(SeedRequest {
        platform: VariationsPlatform::AndroidWebview,
        restrict_mode: settings.restrict_mode.clone(),
        milestone,
        channel,
    })
}

impl SeedFetcher {
    /// Run one activation of the fetch job. `params` is None when the platform
    /// supplies no extras; the request count then starts at 0.
    ///
    /// Never fails: storage errors are logged and the job still completes.
    pub async fn on_start(&self, params: Option<JobParameters>) -> JobFinished {
        let mut params = params.unwrap_or_default();
        let request_count = params.extras.request_count;

        let request = match seed_request(&self.settings) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(job_id = params.job_id, "seed fetch not attempted: {}", e);
                return JobFinished {
                    params,
                    needs_reschedule: false,
                    activation: Activation::ConfigurationInvalid(e),
                    metrics: None,
                };
            }
        };

        let previous = match self.db.read_metrics().await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("read metrics prefs: {:#}", e);
                Default::default()
            }
        };
        let start = self.clock.now_millis();
        let mut metrics = begin_job_metrics(&previous, start);

        let downloader = Arc::clone(&self.downloader);
        let download = tokio::task::spawn_blocking(move || downloader.download(&request));
        let result_code = match download.await {
            Ok(Ok(info)) => info.result_code,
            Ok(Err(e)) => {
                tracing::warn!(job_id = params.job_id, "seed download failed: {}", e);
                TRANSPORT_FAILURE_CODE
            }
            Err(e) => {
                tracing::warn!(job_id = params.job_id, "seed download task: {}", e);
                TRANSPORT_FAILURE_CODE
            }
        };
        let end = self.clock.now_millis();

        metrics.seed_fetch_time = Some(elapsed_millis(start, end));
        metrics.seed_fetch_result = Some(result_code);
        let committed = match self.db.write_metrics(&metrics).await {
            Ok(()) => Some(metrics),
            Err(e) => {
                tracing::warn!("commit metrics prefs: {:#}", e);
                None
            }
        };

        let outcome = FetchOutcome::classify(result_code);
        let needs_reschedule = match outcome {
            FetchOutcome::Fetched => {
                if let Err(e) = self.stamp.touch(end) {
                    tracing::warn!("update stamp: {:#}", e);
                }
                false
            }
            FetchOutcome::Permanent => false,
            FetchOutcome::Transient => {
                if request_count.saturating_add(1) >= self.settings.max_request_count {
                    tracing::info!(
                        request_count,
                        max = self.settings.max_request_count,
                        "giving up on seed fetch after repeated failures"
                    );
                    false
                } else {
                    params.extras.request_count = request_count + 1;
                    true
                }
            }
        };

        tracing::info!(
            job_id = params.job_id,
            result_code,
            ?outcome,
            duration_ms = elapsed_millis(start, end),
            needs_reschedule,
            "seed fetch job finished"
        );
        JobFinished {
            params,
            needs_reschedule,
            activation: Activation::Completed {
                result_code,
                outcome,
            },
            metrics: committed,
        }
    }

    /// The platform stopped a running activation. No reschedule is requested and
    /// no retry slot is charged.
    pub fn on_stop(&self, params: &JobParameters) -> bool {
        tracing::info!(
            job_id = params.job_id,
            request_count = params.extras.request_count,
            "seed fetch job stopped by platform"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_request_requires_milestone_and_channel() {
        let mut s = FetcherSettings::default();
        assert_eq!(seed_request(&s), Err(RequestConfigError::MissingMilestone));

        s.milestone = Some(0);
        assert_eq!(seed_request(&s), Err(RequestConfigError::MissingMilestone));

        s.milestone = Some(120);
        assert_eq!(seed_request(&s), Err(RequestConfigError::MissingChannel));

        s.channel = Some("  ".into());
        assert_eq!(seed_request(&s), Err(RequestConfigError::MissingChannel));

        s.channel = Some("stable".into());
        let req = seed_request(&s).unwrap();
        assert_eq!(req.platform, VariationsPlatform::AndroidWebview);
        assert_eq!(req.milestone, 120);
        assert_eq!(req.channel, "stable");
    }
}
