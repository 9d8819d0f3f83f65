//! Retry with exponential backoff and jitter for synchronous provider calls.
//!
//! [`retry_with_backoff`] wraps one request/response exchange and retries on
//! transient failures (HTTP 429, 5xx, connection or timeout errors). Every
//! other error is returned immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ProviderError;

/// Capped exponential backoff schedule.
///
/// The wait before retry `n` (zero-based) is
/// `base_delay * factor^n + uniform(0..=max_jitter)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(400),
            factor: 2,
            max_jitter: Duration::from_millis(150),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &reviewlens_core::AppConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            factor: 2,
            max_jitter: Duration::from_millis(config.retry_max_jitter_ms),
        }
    }

    /// A single attempt, no waiting. Handy for tests and one-shot calls.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            factor: 2,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (zero-based), jitter excluded.
    #[must_use]
    pub fn base_delay_for(&self, retry: u32) -> Duration {
        let multiplier = self.factor.max(1).saturating_pow(retry.min(16));
        self.base_delay.saturating_mul(multiplier)
    }

    fn delay_for(&self, retry: u32) -> Duration {
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_ms)
        };
        self.base_delay_for(retry) + Duration::from_millis(jitter)
    }
}

/// Returns `true` if `err` is transient and worth another attempt.
///
/// Retriable:
/// - [`ProviderError::RateLimited`] — HTTP 429.
/// - [`ProviderError::UnexpectedStatus`] with a 5xx status.
/// - [`ProviderError::Http`] for timeouts and connection failures.
///
/// Everything else (4xx, malformed bodies, missing credentials) fails fast.
pub(crate) fn is_retriable(err: &ProviderError) -> bool {
    match err {
        ProviderError::RateLimited { .. } => true,
        ProviderError::UnexpectedStatus { status, .. } => *status >= 500,
        ProviderError::Http { source, .. } => {
            source.is_timeout() || source.is_connect() || source.is_request()
        }
        ProviderError::ConfigurationMissing { .. }
        | ProviderError::Deserialize { .. }
        | ProviderError::Api { .. }
        | ProviderError::NotFound { .. }
        | ProviderError::Timeout { .. }
        | ProviderError::InvalidUrl { .. } => false,
    }
}

/// Executes `operation` under `policy`, sleeping between transient failures.
///
/// With the default policy the operation runs at most 4 times, waiting
/// roughly 400ms, 800ms and 1600ms (plus up to 150ms jitter) in between.
/// The last error is returned once attempts are exhausted.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &'static str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    provider,
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient provider error — retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            factor: 2,
            max_jitter: Duration::ZERO,
        }
    }

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            provider: "test",
        }
    }

    #[test]
    fn base_delay_doubles_each_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_for(0), Duration::from_millis(400));
        assert_eq!(policy.base_delay_for(1), Duration::from_millis(800));
        assert_eq!(policy.base_delay_for(2), Duration::from_millis(1_600));
    }

    #[test]
    fn jittered_delay_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(950));
        }
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        assert!(is_retriable(&ProviderError::status("test", 503, "")));
        assert!(!is_retriable(&ProviderError::status("test", 404, "")));
        assert!(!is_retriable(&ProviderError::ConfigurationMissing {
            provider: "test",
            var: "KEY",
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&instant_policy(4), "test", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ProviderError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&instant_policy(4), "test", || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 3 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, ProviderError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&instant_policy(3), "test", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ProviderError>(rate_limited())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&instant_policy(4), "test", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ProviderError>(ProviderError::status("test", 401, "bad key"))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(ProviderError::UnexpectedStatus { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&instant_policy(4), "test", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                let e = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
                Err::<u32, ProviderError>(ProviderError::Deserialize {
                    context: "test".to_owned(),
                    source: e,
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ProviderError::Deserialize { .. })));
    }
}
