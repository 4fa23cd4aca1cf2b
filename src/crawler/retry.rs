//! Retry classification and timing for page fetches

use crate::config::{CrawlerConfig, FetchConfig};
use reqwest::StatusCode;
use std::time::Duration;

/// Whether a failed attempt is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transient: timeouts, connection problems, server errors
    Retryable,
    /// The resource itself is the problem; give up immediately
    Terminal,
}

/// Classifies a response status, returning `None` for success
///
/// Only server errors are retried. A 3xx that survives redirect handling
/// (304, or a redirect without `Location`) is as final as a 4xx.
pub fn classify_status(status: StatusCode) -> Option<FailureKind> {
    if status.is_success() {
        None
    } else if status.is_server_error() {
        Some(FailureKind::Retryable)
    } else {
        Some(FailureKind::Terminal)
    }
}

/// Classifies a transport error
///
/// Malformed requests and redirect loops will fail the same way again;
/// everything else (connect, timeout, reset, body read) may not.
pub fn classify_error(error: &reqwest::Error) -> FailureKind {
    if error.is_builder() || error.is_redirect() {
        FailureKind::Terminal
    } else {
        FailureKind::Retryable
    }
}

/// Attempt limits and per-attempt timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_timeout: Duration,
    pub timeout_step: Duration,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(crawler: &CrawlerConfig, fetch: &FetchConfig) -> Self {
        Self {
            max_retries: crawler.max_retries,
            base_timeout: Duration::from_millis(fetch.request_timeout_ms),
            timeout_step: Duration::from_millis(fetch.timeout_step_ms),
            backoff: Duration::from_millis(fetch.retry_backoff_ms),
        }
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Request timeout for a zero-based attempt number
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        self.base_timeout + self.timeout_step * attempt
    }

    /// Sleep before the given zero-based attempt
    ///
    /// Zero before the first attempt, then growing linearly.
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::from_config(&CrawlerConfig::default(), &FetchConfig::default())
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), None);
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            Some(FailureKind::Terminal)
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Some(FailureKind::Terminal)
        );
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Some(FailureKind::Retryable)
        );
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            Some(FailureKind::Retryable)
        );
    }

    #[test]
    fn test_leftover_redirects_are_terminal() {
        assert_eq!(
            classify_status(StatusCode::NOT_MODIFIED),
            Some(FailureKind::Terminal)
        );
        assert_eq!(
            classify_status(StatusCode::FOUND),
            Some(FailureKind::Terminal)
        );
        assert_eq!(
            classify_status(StatusCode::CONTINUE),
            Some(FailureKind::Terminal)
        );
    }

    #[test]
    fn test_attempts_from_defaults() {
        assert_eq!(policy().max_attempts(), 3);
    }

    #[test]
    fn test_timeout_grows_per_attempt() {
        let policy = policy();
        assert_eq!(policy.timeout_for(0), Duration::from_secs(10));
        assert_eq!(policy.timeout_for(1), Duration::from_secs(15));
        assert_eq!(policy.timeout_for(2), Duration::from_secs(20));
    }

    #[test]
    fn test_linear_backoff() {
        let policy = policy();
        assert_eq!(policy.backoff_before(0), Duration::ZERO);
        assert_eq!(policy.backoff_before(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_before(2), Duration::from_secs(2));
    }
}
