//! Retry policy for provider calls
//!
//! Transient failures (5xx, rate limits, dropped connections) are retried
//! with exponential backoff; anything else fails the call immediately.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

const TRANSIENT_PATTERNS: &[&str] = &[
    "500",
    "502",
    "503",
    "504",
    "internal server error",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
    "429",
    "rate limit",
    "too many requests",
    "timeout",
    "timed out",
    "connection refused",
    "connection reset",
    "connection closed",
    "overloaded",
    "temporarily unavailable",
];

/// Whether an error message looks transient
pub fn is_retriable_error(error_message: &str) -> bool {
    let lower = error_message.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Build an exponential backoff strategy from configuration
pub fn build_backoff(config: &RetryConfig) -> ExponentialBuilder {
    let builder = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_max_times(config.max_retries);

    if config.jitter {
        builder.with_jitter()
    } else {
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(is_retriable_error("azure returned 503 Service Unavailable"));
        assert!(is_retriable_error("429 Too Many Requests"));
        assert!(is_retriable_error("error sending request: connection reset by peer"));
        assert!(is_retriable_error("operation timed out"));
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!is_retriable_error("401 Unauthorized"));
        assert!(!is_retriable_error("404 DeploymentNotFound"));
        assert!(!is_retriable_error("400 Bad Request: invalid messages"));
    }

    #[test]
    fn test_config_builder() {
        let config = RetryConfig::default().with_max_retries(0);
        assert_eq!(config.max_retries, 0);
        assert!(config.jitter);
    }
}
