//! Rate-limit retry loop
//!
//! Only rate-limit failures are retried. The backoff starts at
//! `initial_backoff` and doubles after every retry; the default config sets
//! no attempt limit and no cap, so sustained throttling is bounded only by
//! the request context.

use super::error::ApiError;
use std::future::Future;
use std::time::Duration;
use tfplug::Context;

/// Classifies errors for the retry loop
pub trait Retryable {
    fn is_rate_limited(&self) -> bool;
}

impl Retryable for ApiError {
    fn is_rate_limited(&self) -> bool {
        ApiError::is_rate_limited(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub initial_backoff: Duration,
    /// Upper bound for a single sleep, `None` for uncapped doubling
    pub max_backoff: Option<Duration>,
    /// Retries after the first attempt, `None` for unlimited
    pub max_retries: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: None,
            max_retries: None,
        }
    }
}

impl RetryConfig {
    fn next_backoff(&self, current: Duration) -> Duration {
        let doubled = current.saturating_mul(2);
        match self.max_backoff {
            Some(cap) => doubled.min(cap),
            None => doubled,
        }
    }
}

/// Run `op` until it succeeds, fails with a non-rate-limit error, or a
/// retry bound is hit. On a bound the last rate-limit error is returned.
pub async fn retry_with_backoff<T, E, F, Fut>(
    ctx: &Context,
    config: &RetryConfig,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = match config.max_backoff {
        Some(cap) => config.initial_backoff.min(cap),
        None => config.initial_backoff,
    };
    let mut retries: u32 = 0;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_rate_limited() => return Err(err),
            Err(err) => err,
        };

        if config.max_retries.is_some_and(|max| retries >= max) {
            tracing::warn!("Rate limited after {} retries, giving up", retries);
            return Err(err);
        }
        if ctx.is_cancelled() {
            return Err(err);
        }
        if ctx.remaining().is_some_and(|remaining| backoff > remaining) {
            tracing::warn!(
                "Rate limited; next backoff of {:?} would pass the request deadline",
                backoff
            );
            return Err(err);
        }

        tracing::debug!(
            "Rate limited ({}), retrying in {:?} (retry {})",
            err,
            backoff,
            retries + 1
        );

        let mut done = ctx.done();
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            _ = done.wait_for(|cancelled| *cancelled) => return Err(err),
        }

        retries += 1;
        backoff = config.next_backoff(backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn rate_limited() -> ApiError {
        ApiError::from_response(
            429,
            r#"{"error":{"type":"invalid_request_error","code":"rate_limit","message":"Too many requests"}}"#,
        )
    }

    fn invalid() -> ApiError {
        ApiError::from_response(
            400,
            r#"{"error":{"type":"invalid_request_error","message":"Invalid currency"}}"#,
        )
    }

    /// An operation that rate-limits `failures` times, then succeeds
    fn flaky(
        calls: Arc<AtomicU32>,
        failures: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<&'static str, ApiError>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < failures {
                Err(rate_limited())
            } else {
                Ok("done")
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limits_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = retry_with_backoff(
            &Context::new(),
            &RetryConfig::default(),
            flaky(calls.clone(), 2),
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_from_initial() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        retry_with_backoff(&Context::new(), &RetryConfig::default(), flaky(calls.clone(), 4))
            .await
            .unwrap();

        // 1 + 2 + 4 + 8
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(start.elapsed() >= Duration::from_secs(15));
        assert!(start.elapsed() < Duration::from_secs(16));
    }

    #[tokio::test]
    async fn terminal_error_is_returned_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), ApiError> =
            retry_with_backoff(&Context::new(), &RetryConfig::default(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(invalid()))
            })
            .await;

        assert!(!result.unwrap_err().is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn max_retries_bounds_the_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig {
            max_retries: Some(2),
            ..RetryConfig::default()
        };

        let result = retry_with_backoff(&Context::new(), &config, flaky(calls.clone(), 10)).await;

        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn max_backoff_caps_each_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Some(Duration::from_secs(2)),
            max_retries: None,
        };
        let start = Instant::now();

        retry_with_backoff(&Context::new(), &config, flaky(calls.clone(), 4))
            .await
            .unwrap();

        // 1 + 2 + 2 + 2
        assert!(start.elapsed() >= Duration::from_secs(7));
        assert!(start.elapsed() < Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_stops_before_oversleeping() {
        let calls = Arc::new(AtomicU32::new(0));
        let ctx = Context::new().with_timeout(Duration::from_millis(2500));

        let result = retry_with_backoff(&ctx, &RetryConfig::default(), flaky(calls.clone(), 100)).await;

        // sleeps 1s, then 2s would pass the deadline
        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let ctx = Context::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });
        let start = Instant::now();

        let result = retry_with_backoff(&ctx, &RetryConfig::default(), flaky(calls.clone(), 100)).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
