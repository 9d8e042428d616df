//! Bounded retry with linear backoff for outbound reads
//!
//! A request that is rate limited (HTTP 429) waits `base_delay * attempt`
//! before the next try and notifies the observer first. Any other retryable
//! failure waits a flat `base_delay`. When the last attempt fails the caller
//! always receives [`FetchError::Exhausted`] wrapping the last error.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::FetchError;

/// Default number of attempts per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay between attempts
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Progress information handed to a [`RetryObserver`] before each rate-limit delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based number of the attempt that just failed
    pub attempt: u32,
    /// How long the policy will sleep before the next attempt
    pub delay: Duration,
}

/// Receives retry progress notifications.
///
/// Any `FnMut(&RetryAttempt)` closure is an observer.
pub trait RetryObserver {
    fn on_retry(&mut self, attempt: &RetryAttempt);
}

impl<F> RetryObserver for F
where
    F: FnMut(&RetryAttempt),
{
    fn on_retry(&mut self, attempt: &RetryAttempt) {
        self(attempt)
    }
}

/// Attempt budget and base delay for one logical read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

impl RetryPolicy {
    /// Creates a policy. A `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to sleep after `attempt` failed with `err`
    pub fn delay_for(&self, attempt: u32, err: &FetchError) -> Duration {
        if err.is_rate_limited() {
            self.base_delay.saturating_mul(attempt)
        } else {
            self.base_delay
        }
    }

    /// Runs `op` until it succeeds, fails with a final error, or the attempt
    /// budget is spent.
    ///
    /// # Arguments
    /// * `op` - Produces a fresh request future for every attempt
    /// * `observer` - Notified before each rate-limit delay
    ///
    /// # Returns
    /// * `Ok(T)` from the first successful attempt
    /// * `Err(FetchError::Exhausted)` once every attempt failed
    /// * `Err(e)` immediately for non-retryable errors
    pub async fn run<T, F, Fut>(
        &self,
        mut op: F,
        mut observer: Option<&mut (dyn RetryObserver + Send)>,
    ) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;

        loop {
            let err = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt >= self.max_attempts {
                warn!(attempts = attempt, error = %err, "Giving up on request");
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.delay_for(attempt, &err);

            if err.is_rate_limited() {
                info!(
                    attempt,
                    max_attempts = self.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limit exceeded, retrying"
                );
                if let Some(observer) = observer.as_deref_mut() {
                    observer.on_retry(&RetryAttempt { attempt, delay });
                }
            } else {
                warn!(
                    attempt,
                    max_attempts = self.max_attempts,
                    error = %err,
                    "Request failed, retrying"
                );
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Convenience wrapper around [`RetryPolicy::run`]
pub async fn fetch_with_retry<T, F, Fut>(
    op: F,
    max_attempts: u32,
    base_delay: Duration,
    observer: Option<&mut (dyn RetryObserver + Send)>,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    RetryPolicy::new(max_attempts, base_delay)
        .run(op, observer)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    const BASE: Duration = Duration::from_millis(2000);

    #[test]
    fn test_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, BASE);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_delay_is_linear_for_rate_limit_and_flat_otherwise() {
        let policy = RetryPolicy::new(5, BASE);
        assert_eq!(policy.delay_for(1, &FetchError::RateLimited), BASE);
        assert_eq!(policy.delay_for(3, &FetchError::RateLimited), BASE * 3);
        assert_eq!(policy.delay_for(3, &FetchError::Status(500)), BASE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_twice_then_success() {
        let calls = &AtomicU32::new(0);
        let mut seen = Vec::new();
        let mut observer = |a: &RetryAttempt| seen.push(a.attempt);

        let start = Instant::now();
        let result = fetch_with_retry(
            || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(FetchError::RateLimited)
                } else {
                    Ok("payload")
                }
            },
            3,
            BASE,
            Some(&mut observer),
        )
        .await;

        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(start.elapsed(), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_rate_limited_exhausts() {
        for n in 1..=5u32 {
            let calls = &AtomicU32::new(0);
            let mut notified = 0u32;
            let mut observer = |_: &RetryAttempt| notified += 1;

            let result: Result<(), _> = fetch_with_retry(
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::RateLimited)
                },
                n,
                BASE,
                Some(&mut observer),
            )
            .await;

            assert_eq!(calls.load(Ordering::SeqCst), n);
            assert_eq!(notified, n - 1);
            match result {
                Err(FetchError::Exhausted { attempts, last }) => {
                    assert_eq!(attempts, n);
                    assert!(last.is_rate_limited());
                }
                other => panic!("expected Exhausted, got {:?}", other),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_attempt_k_stops() {
        for k in 1..=4u32 {
            let calls = &AtomicU32::new(0);
            let result = fetch_with_retry(
                || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < k {
                        Err(FetchError::Status(503))
                    } else {
                        Ok(n)
                    }
                },
                4,
                BASE,
                None,
            )
            .await;

            assert_eq!(result.unwrap(), k);
            assert_eq!(calls.load(Ordering::SeqCst), k);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_failures_use_flat_delay_and_skip_observer() {
        let calls = &AtomicU32::new(0);
        let mut notified = 0u32;
        let mut observer = |_: &RetryAttempt| notified += 1;

        let start = Instant::now();
        let result: Result<(), _> = fetch_with_retry(
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Status(500))
            },
            3,
            BASE,
            Some(&mut observer),
        )
        .await;

        assert!(matches!(result, Err(FetchError::Exhausted { attempts: 3, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(notified, 0);
        assert_eq!(start.elapsed(), BASE * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_data_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = fetch_with_retry(
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::UpstreamDataMissing("results".to_string()))
            },
            3,
            BASE,
            None,
        )
        .await;

        assert!(matches!(result, Err(FetchError::UpstreamDataMissing(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_failure_reports_exhausted() {
        let result: Result<(), _> =
            fetch_with_retry(|| async { Err(FetchError::Status(502)) }, 1, BASE, None).await;

        match result {
            Err(FetchError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 1);
                assert!(matches!(*last, FetchError::Status(502)));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }
}
