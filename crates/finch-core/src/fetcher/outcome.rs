//! Classify a seed request result code into a scheduling outcome.

/// Result code recorded when the downloader failed before producing a status.
pub const TRANSPORT_FAILURE_CODE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The request completed and the seed is current. Stamp is touched.
    Fetched,
    /// Retriable failure (transport, timeout, throttling, 5xx).
    Transient,
    /// Terminal answer such as 404: no reschedule, no stamp.
    Permanent,
}

impl FetchOutcome {
    pub fn classify(result_code: i64) -> FetchOutcome {
        match result_code {
            i64::MIN..=-1 => FetchOutcome::Transient,
            0 | 200..=299 | 304 => FetchOutcome::Fetched,
            408 | 429 | 500..=599 => FetchOutcome::Transient,
            _ => FetchOutcome::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_codes_are_fetched() {
        assert_eq!(FetchOutcome::classify(0), FetchOutcome::Fetched);
        assert_eq!(FetchOutcome::classify(200), FetchOutcome::Fetched);
        assert_eq!(FetchOutcome::classify(304), FetchOutcome::Fetched);
    }

    #[test]
    fn transport_and_server_errors_are_transient() {
        assert_eq!(FetchOutcome::classify(TRANSPORT_FAILURE_CODE), FetchOutcome::Transient);
        assert_eq!(FetchOutcome::classify(-42), FetchOutcome::Transient);
        assert_eq!(FetchOutcome::classify(429), FetchOutcome::Transient);
        assert_eq!(FetchOutcome::classify(503), FetchOutcome::Transient);
        assert_eq!(FetchOutcome::classify(408), FetchOutcome::Transient);
    }

    #[test]
    fn other_codes_are_permanent() {
        assert_eq!(FetchOutcome::classify(404), FetchOutcome::Permanent);
        assert_eq!(FetchOutcome::classify(403), FetchOutcome::Permanent);
        assert_eq!(FetchOutcome::classify(302), FetchOutcome::Permanent);
    }
}
