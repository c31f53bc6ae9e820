use std::time::Duration;

use redpay_core::status::STATUS_CODE_RETRY;
use redpay_core::ReconcileConfig;

/// Fixed-delay retry for authorizations the remote asked to re-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before each retry.
    pub delay: Duration,
    /// Retries allowed per order and pass. `None` retries until stopped.
    pub max_attempts: Option<u32>,
    /// Remote status codes that trigger a retry.
    pub retryable_codes: Vec<String>,
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            delay,
            max_attempts,
            retryable_codes: vec![STATUS_CODE_RETRY.to_string()],
        }
    }

    /// Retry for as long as the remote asks to.
    pub fn unbounded(delay: Duration) -> Self {
        Self::new(delay, None)
    }

    pub fn with_retryable_codes(mut self, codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.retryable_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_retryable(&self, status_code: &str) -> bool {
        self.retryable_codes.iter().any(|code| code == status_code)
    }

    /// Whether retry number `attempt` (1-based) may run.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ReconcileConfig::default())
    }
}

impl From<&ReconcileConfig> for RetryPolicy {
    fn from(config: &ReconcileConfig) -> Self {
        Self::new(config.retry_delay(), config.retry_cap())
            .with_retryable_codes(config.retry_status_codes.iter().cloned())
    }
}
