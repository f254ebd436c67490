//! Exponential-backoff retry for fallible async operations.
//!
//! [`retry_with_backoff`] re-runs an operation while it fails with a
//! transient error, sleeping `min(initial_delay * 2^(n-1), max_delay)`
//! before the n-th retry. Callers observe progress through the
//! `on_retry` callback, typically to drive a
//! [`ConnectionMonitor`](crate::connection::ConnectionMonitor).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::error::Classify;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default upper bound on the delay between attempts.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Tunable parameters for the backoff strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt. Total calls is `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Progress report handed to the `on_retry` callback before each sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based retry number (the first retry is the second call).
    pub attempt: u32,
    /// How long the loop will sleep before making the call.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Delay before the given 1-based retry, clamped to [`max_delay`](Self::max_delay).
    ///
    /// Overflow of the doubling saturates at `max_delay`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Run `operation` until it succeeds, fails with a non-transient error, or
/// the retry budget is exhausted.
///
/// The error from the last call is returned unchanged.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    mut operation: F,
    mut on_retry: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
    R: FnMut(RetryAttempt),
{
    let mut retry = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retry > 0 {
                    tracing::info!(retries = retry, "Operation succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let kind = err.kind();
        if !kind.is_transient() {
            tracing::debug!(error = %err, %kind, "Operation failed with non-retryable error");
            return Err(err);
        }
        if retry >= policy.max_retries {
            tracing::warn!(
                error = %err,
                attempts = retry + 1,
                "Operation failed after exhausting retries",
            );
            return Err(err);
        }

        retry += 1;
        let delay = policy.delay_for_retry(retry);
        tracing::warn!(
            error = %err,
            attempt = retry,
            delay_ms = delay.as_millis() as u64,
            "Transient failure, retrying",
        );
        on_retry(RetryAttempt {
            attempt: retry,
            delay,
        });

        tokio::time::sleep(delay).await;
    }
}
