//! Process-global token-bucket rate limiter. Not per-host: all
//! outbound calls share one bucket.

use crate::constants::{RATE_LIMITER_CAPACITY, RATE_LIMITER_REFILL_PER_SEC};
use crate::error::Error;
use std::sync::Mutex;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMITER_CAPACITY, RATE_LIMITER_REFILL_PER_SEC)
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(capacity: u32, refill_per_sec: u32) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_sec: f64::from(refill_per_sec),
            bucket: Mutex::new(Bucket { tokens: f64::from(capacity), last_refill: Instant::now() }),
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;
    }

    fn try_admit(&self) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.refill(&mut bucket);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Awaits a token, or returns `Error::Cancelled` if `cancel` fires
    /// first.
    ///
    /// # Errors
    /// Returns `Error::Cancelled` if the cancellation token fires
    /// before a token becomes available.
    pub async fn admit(&self, cancel: &CancellationToken) -> Result<(), Error> {
        loop {
            if self.try_admit() {
                return Ok(());
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let poll_interval = Duration::from_secs_f64((1.0 / self.refill_per_sec).max(0.01));
            tokio::select! {
                () = sleep(poll_interval) => {}
                () = cancel.cancelled() => return Err(Error::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_capacity_immediately() {
        let limiter = RateLimiter::new(3, 1);
        let cancel = CancellationToken::new();
        for _ in 0..3 {
            limiter.admit(&cancel).await.unwrap();
        }
        assert!(!limiter.try_admit());
    }

    #[tokio::test]
    async fn refills_over_time() {
        let limiter = RateLimiter::new(1, 1000);
        let cancel = CancellationToken::new();
        limiter.admit(&cancel).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(limiter.try_admit());
    }

    #[tokio::test]
    async fn cancellation_short_circuits_wait() {
        let limiter = RateLimiter::new(0, 1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = limiter.admit(&cancel).await.unwrap_err();
        assert_eq!(err.kind(), "Cancelled");
    }
}
