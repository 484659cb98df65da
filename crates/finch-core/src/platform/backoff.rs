use std::time::Duration;

use crate::config::BackoffConfig;

/// Exponential reschedule delay: `base * 2^request_count`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}

impl BackoffPolicy {
    pub fn from_config(cfg: &BackoffConfig) -> Self {
        let base = if cfg.base_delay_secs.is_finite() && cfg.base_delay_secs > 0.0 {
            Duration::from_secs_f64(cfg.base_delay_secs)
        } else {
            Duration::ZERO
        };
        Self {
            base_delay: base,
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }

    /// Delay before the retry that carries `request_count` failed attempts.
    /// `request_count` is at least 1 for a rescheduled job.
    pub fn delay(&self, request_count: u32) -> Duration {
        let exp = 1u32 << request_count.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }

    pub fn delay_millis(&self, request_count: u32) -> i64 {
        i64::try_from(self.delay(request_count).as_millis()).unwrap_or(i64::MAX)
    }
}
