//! Retry utilities for transient HTTP failures.
//!
//! Provides classification of retryable errors, exponential backoff, and a
//! retry loop shared by the HTTP backends.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use std::future::Future;
use std::time::Duration;

/// How many times, and how patiently, a backend retries a call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub attempts: u32,
    /// Base backoff delay in milliseconds
    pub delay_ms: u64,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            attempts: 0,
            delay_ms: 0,
        }
    }
}

impl From<&PipelineConfig> for RetryPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            attempts: config.retry_attempts,
            delay_ms: config.retry_delay_ms,
        }
    }
}

/// Determine whether a pipeline error is worth retrying.
///
/// Retryable errors: timeouts, rate limits (429), server errors (5xx).
/// Non-retryable: bad requests, missing models, local file errors.
pub fn is_retryable(error: &PipelineError) -> bool {
    let (status_code, message) = match error {
        PipelineError::Timeout { .. } => return true,
        PipelineError::Interrogation {
            status_code,
            message,
            ..
        }
        | PipelineError::Generation {
            status_code,
            message,
        } => (status_code, message),
        _ => return false,
    };

    // Classify by HTTP status code when available (structured)
    if let Some(code) = status_code {
        return *code == 429 || (500..=599).contains(code);
    }
    // Fallback for non-HTTP errors (e.g., connection refused, DNS failure)
    message.contains("timed out") || message.contains("connect")
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> PipelineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PipelineResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.attempts && is_retryable(&e) => {
                let delay = backoff_duration(attempt, policy.delay_ms);
                attempt += 1;
                tracing::debug!(
                    "Retry {attempt}/{} for {label} after {delay:?}: {e}",
                    policy.attempts
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
