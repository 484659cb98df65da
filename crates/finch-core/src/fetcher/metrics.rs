//! Scheduler metrics: what one activation writes to prefs, and how prefs turn
//! into histogram records for the metrics bridge.

use crate::bridge::HistogramRecord;
use crate::clock::elapsed_millis;
use crate::state_db::MetricsPrefs;

pub const FETCH_RESULT_HISTOGRAM: &str = "Variations.WebViewDownloadJobFetchResult";
pub const FETCH_TIME_HISTOGRAM: &str = "Variations.WebViewDownloadJobFetchTime";
pub const JOB_INTERVAL_HISTOGRAM: &str = "Variations.WebViewDownloadJobInterval";
pub const JOB_QUEUE_TIME_HISTOGRAM: &str = "Variations.WebViewDownloadJobQueueTime";

const MINUTE_MS: i64 = 60 * 1000;
const FETCH_TIME_MAX_MS: i64 = 3 * MINUTE_MS;
const JOB_TIME_MAX_MINUTES: i64 = 14 * 24 * 60;
const BUCKETS: i64 = 50;

/// Metrics for an activation starting at `now`, derived from the previous snapshot.
/// The enqueue time is consumed; fetch result and duration are filled in after the download.
pub fn begin_job_metrics(previous: &MetricsPrefs, now: i64) -> MetricsPrefs {
    MetricsPrefs {
        job_interval: previous.last_job_start_time.map(|t| elapsed_millis(t, now)),
        job_queue_time: previous.last_enqueue_time.map(|t| elapsed_millis(t, now)),
        last_job_start_time: Some(now),
        last_enqueue_time: None,
        seed_fetch_result: None,
        seed_fetch_time: None,
    }
}

/// Histogram records for every set result field. Timestamps are not reported.
pub fn records_from_prefs(metrics: &MetricsPrefs) -> Vec<HistogramRecord> {
    let mut out = Vec::new();
    if let Some(code) = metrics.seed_fetch_result {
        out.push(HistogramRecord::sparse(FETCH_RESULT_HISTOGRAM, code));
    }
    if let Some(ms) = metrics.seed_fetch_time {
        out.push(HistogramRecord::exponential(
            FETCH_TIME_HISTOGRAM,
            ms,
            1,
            FETCH_TIME_MAX_MS,
            BUCKETS,
        ));
    }
    if let Some(ms) = metrics.job_interval {
        out.push(HistogramRecord::exponential(
            JOB_INTERVAL_HISTOGRAM,
            ms / MINUTE_MS,
            1,
            JOB_TIME_MAX_MINUTES,
            BUCKETS,
        ));
    }
    if let Some(ms) = metrics.job_queue_time {
        out.push(HistogramRecord::exponential(
            JOB_QUEUE_TIME_HISTOGRAM,
            ms / MINUTE_MS,
            1,
            JOB_TIME_MAX_MINUTES,
            BUCKETS,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

    #[test]
    fn first_job_has_no_interval_or_queue_time() {
        let m = begin_job_metrics(&MetricsPrefs::default(), 100);
        assert_eq!(m.last_job_start_time, Some(100));
        assert!(m.job_interval.is_none());
        assert!(m.job_queue_time.is_none());
        assert!(m.last_enqueue_time.is_none());
    }

    #[test]
    fn interval_and_queue_time_from_previous_snapshot() {
        let previous = MetricsPrefs {
            last_job_start_time: Some(100),
            last_enqueue_time: Some(100 + 2 * DAY_MS),
            job_queue_time: Some(7),
            ..MetricsPrefs::default()
        };
        let now = 100 + 2 * DAY_MS + 2000;
        let m = begin_job_metrics(&previous, now);
        assert_eq!(m.job_interval, Some(2 * DAY_MS + 2000));
        assert_eq!(m.job_queue_time, Some(2000));
        assert_eq!(m.last_job_start_time, Some(now));
        assert!(m.last_enqueue_time.is_none());
    }

    #[test]
    fn backwards_clock_clamps_durations_to_zero() {
        let previous = MetricsPrefs {
            last_job_start_time: Some(5000),
            last_enqueue_time: Some(6000),
            ..MetricsPrefs::default()
        };
        let m = begin_job_metrics(&previous, 1000);
        assert_eq!(m.job_interval, Some(0));
        assert_eq!(m.job_queue_time, Some(0));
    }

    #[test]
    fn records_only_for_set_fields() {
        let m = MetricsPrefs {
            seed_fetch_result: Some(404),
            seed_fetch_time: Some(10),
            last_job_start_time: Some(1),
            ..MetricsPrefs::default()
        };
        let records = records_from_prefs(&m);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![FETCH_RESULT_HISTOGRAM, FETCH_TIME_HISTOGRAM]);
        assert_eq!(records[0].sample, 404);
        assert_eq!(records[1].sample, 10);
    }

    #[test]
    fn job_times_are_reported_in_minutes() {
        let m = MetricsPrefs {
            job_interval: Some(2 * DAY_MS + 2000),
            job_queue_time: Some(2000),
            ..MetricsPrefs::default()
        };
        let records = records_from_prefs(&m);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sample, 2 * 24 * 60);
        assert_eq!(records[1].sample, 0);
    }
}
