use serde::{Deserialize, Serialize};
use weft_core::WeftError;

/// Configures retry behaviour for transient provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub backoff_base_ms: u64,
    /// Maximum delay in milliseconds (cap for exponential backoff).
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 12,
            backoff_base_ms: 1_000,
            backoff_max_ms: 30_000,
        }
    }
}

/// Determines whether a provider error is transient and worth retrying.
///
/// Rate limits (429), server errors (5xx), and timeouts are retryable.
/// Client errors (400, 401, 403, 404) are not expected to succeed on retry.
pub fn is_retryable(err: &WeftError) -> bool {
    let lower = err.to_string().to_lowercase();

    // Non-retryable patterns checked first
    if lower.contains("400")
        || lower.contains("401")
        || lower.contains("403")
        || lower.contains("404")
    {
        return false;
    }

    lower.contains("429")
        || lower.contains("500")
        || lower.contains("502")
        || lower.contains("503")
        || lower.contains("504")
        || lower.contains("timeout")
        || lower.contains("connection")
}

/// Computes the backoff delay for a given attempt, capped at
/// `backoff_max_ms`.
pub(crate) fn compute_backoff(policy: &RetryPolicy, attempt: u32) -> u64 {
    let delay = policy
        .backoff_base_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    delay.min(policy.backoff_max_ms)
}
