//! Retry driver: classifies outcomes, backs off exponentially with
//! jitter, honors `Retry-After`, and caps total attempts.

use crate::error::Error;
use std::time::{Duration, SystemTime};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

/// A single outcome the retry driver must classify. The driver itself
/// is transport-agnostic: callers map their raw result into this shape.
pub enum Outcome<T> {
    Success(T),
    /// Retryable failure (network error, timeout, 408, 429, 5xx).
    Retryable { retry_after: Option<Duration> },
    /// Non-retryable failure; returned to the caller unchanged.
    Fatal(Error),
}

/// Parses a `Retry-After` header value: either an integer seconds
/// count or an HTTP-date.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let date = httpdate::parse_http_date(value).ok()?;
    date.duration_since(SystemTime::now()).ok()
}

/// Whether an HTTP status is retryable per the taxonomy: 408, 429, or
/// any 5xx.
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..=599).contains(&status)
}

/// `base * 2^(attempt-1) + jitter`, jitter uniform on `[0, base)`.
/// `attempt` is 1-indexed (the first retry is attempt 1).
#[must_use]
pub fn backoff_delay(base_delay_ms: u64, attempt: u32) -> Duration {
    let exp = 2u64.saturating_pow(attempt.saturating_sub(1));
    let backoff = base_delay_ms.saturating_mul(exp);
    let jitter = (fastrand::f64() * base_delay_ms as f64) as u64;
    Duration::from_millis(backoff.saturating_add(jitter))
}

/// Runs `attempt_fn` under the retry policy, honoring `Retry-After` and
/// a cancellation token. `attempt_fn` is called once per attempt and
/// must itself perform the underlying call (HTTP, etc.) and classify
/// its result into an `Outcome`.
///
/// # Errors
/// Returns the last fatal/retryable-exhausted error, or `Error::Cancelled`
/// if `cancel` fires during a backoff sleep.
pub async fn run<T, F, Fut>(policy: RetryPolicy, cancel: &CancellationToken, mut attempt_fn: F) -> Result<T, Error>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Outcome<T>>,
{
    let max_attempts = policy.max_retries + 1;
    let mut last_retry_after = None;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let outcome = tokio::select! {
            res = attempt_fn(attempt) => res,
            () = cancel.cancelled() => return Err(Error::Cancelled),
        };

        match outcome {
            Outcome::Success(value) => return Ok(value),
            Outcome::Fatal(err) => return Err(err),
            Outcome::Retryable { retry_after } => {
                last_retry_after = retry_after;
                if attempt == max_attempts {
                    return Err(Error::UpstreamUnavailable {
                        reason: "retries exhausted".to_string(),
                        request_id: String::new(),
                    });
                }
                let backoff = backoff_delay(policy.base_delay_ms, attempt);
                let delay = last_retry_after.map_or(backoff, |ra| backoff.max(ra));
                tokio::select! {
                    () = sleep(delay) => {}
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                }
            }
        }
    }

    unreachable!("loop always returns by the last iteration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_status_covers_408_429_and_5xx() {
        assert!(is_retryable_status(408));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn backoff_delay_grows_exponentially_before_jitter() {
        let d1 = backoff_delay(1000, 1).as_millis();
        let d2 = backoff_delay(1000, 2).as_millis();
        assert!(d1 >= 1000 && d1 < 2000);
        assert!(d2 >= 2000 && d2 < 3000);
    }

    #[test]
    fn parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("2").unwrap(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn exhausts_after_max_retries_plus_one_attempts() {
        let policy = RetryPolicy { max_retries: 2, base_delay_ms: 1 };
        let cancel = CancellationToken::new();
        let mut attempts = 0;
        let result: Result<(), Error> = run(policy, &cancel, |_| {
            attempts += 1;
            async { Outcome::Retryable { retry_after: None } }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn succeeds_without_retry_on_first_success() {
        let policy = RetryPolicy { max_retries: 3, base_delay_ms: 1 };
        let cancel = CancellationToken::new();
        let result = run(policy, &cancel, |_| async { Outcome::Success(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn fatal_error_returns_immediately() {
        let policy = RetryPolicy { max_retries: 3, base_delay_ms: 1 };
        let cancel = CancellationToken::new();
        let mut attempts = 0;
        let result: Result<(), Error> = run(policy, &cancel, |_| {
            attempts += 1;
            async { Outcome::Fatal(Error::invalid_argument("bad")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
