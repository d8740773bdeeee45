//! Bounded retry with exponential backoff for transient failures
//!
//! NCBI E-utilities intermittently return 5xx responses under load. Requests
//! are retried a bounded number of times with exponential backoff and jitter;
//! non-transient errors surface immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Classifies errors as transient (worth retrying) or permanent
pub trait RetryableError {
    /// Whether a retry has any chance of succeeding
    fn is_retryable(&self) -> bool;

    /// Short human-readable label for retry logging
    fn retry_reason(&self) -> &str;
}

/// Retry policy: attempt count and backoff bounds
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub initial_delay: Duration,
    /// Upper bound on the backoff delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Policy that never retries
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff delay for a given retry attempt (1-based), capped at `max_delay`
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponential = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        exponential.min(self.max_delay)
    }
}

/// Run `operation`, retrying transient failures per `config`.
///
/// Each retry waits for the exponential backoff delay plus up to 25% random
/// jitter so that concurrent clients do not resynchronize their retries.
pub(crate) async fn with_retry<T, E, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> std::result::Result<T, E>
where
    E: RetryableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempt, "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let backoff = config.delay_for_attempt(attempt);
                let jitter = backoff.mul_f64(rand::thread_rng().gen_range(0.0..0.25));
                let delay = backoff + jitter;

                warn!(
                    operation = operation_name,
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    reason = err.retry_reason(),
                    "Retrying after transient failure"
                );
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
