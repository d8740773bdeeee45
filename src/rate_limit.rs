//! Token bucket rate limiting for NCBI API compliance
//!
//! NCBI E-utilities allow 3 requests per second without an API key and
//! 10 requests per second with one; sustained violations can lead to IP
//! blocking, so every request acquires a token first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{PubMedError, Result};

/// Shared token bucket; cloning hands out another handle to the same bucket
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
}

struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// Create a rate limiter allowing `rate` requests per second
    pub fn new(rate: f64) -> Self {
        let capacity = rate.max(1.0);
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket {
                tokens: capacity,
                capacity,
                refill_rate: rate,
                last_refill: Instant::now(),
            })),
        }
    }

    /// NCBI limit without an API key (3 requests/second)
    pub fn ncbi_default() -> Self {
        Self::new(3.0)
    }

    /// NCBI limit with an API key (10 requests/second)
    pub fn ncbi_with_key() -> Self {
        Self::new(10.0)
    }

    /// Acquire a token, sleeping if none is currently available
    pub async fn acquire(&self) -> Result<()> {
        let wait = {
            let mut bucket = self.bucket.lock().await;
            bucket.refill();

            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                None
            } else {
                Some(Duration::from_secs_f64(1.0 / bucket.refill_rate))
            }
        };

        if let Some(duration) = wait {
            debug!(
                wait_ms = duration.as_millis() as u64,
                "Sleeping to respect rate limit"
            );
            sleep(duration).await;

            let mut bucket = self.bucket.lock().await;
            bucket.refill();

            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
            } else {
                warn!("No token available after backoff wait");
                return Err(PubMedError::RateLimitExceeded);
            }
        }

        Ok(())
    }

    /// Current token count, for tests and monitoring
    pub async fn token_count(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill();
        bucket.tokens
    }

    /// Configured rate (requests per second)
    pub async fn rate(&self) -> f64 {
        self.bucket.lock().await.refill_rate
    }
}
