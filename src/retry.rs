//! Bounded exponential backoff around provider calls.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ReconcileError, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retries throttled operations with `base_delay * 2^attempt` between attempts.
///
/// Each call to [`RetryExecutor::run`] keeps its own attempt counter, so
/// nested retried operations do not share budgets.
#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryExecutor {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept after the failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `op` until it succeeds, fails permanently, or the attempt budget runs out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempts = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt + 1 >= self.max_attempts => {
                    warn!(
                        operation,
                        attempts = self.max_attempts,
                        error = %e,
                        "Retries exhausted"
                    );
                    return Err(ReconcileError::ExhaustedRetries {
                        attempts: self.max_attempts,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Throttled, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::future::ready;

    fn throttled() -> ReconcileError {
        ReconcileError::provider("test", "ThrottlingException", "Rate exceeded")
    }

    fn not_found() -> ReconcileError {
        ReconcileError::provider("test", "ResourceNotFoundException", "No such addon")
    }

    fn executor() -> RetryExecutor {
        RetryExecutor::new(3, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_after_two_throttles() {
        let calls = Cell::new(0u32);
        let result = executor()
            .run("op", || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    ready(Err(throttled()))
                } else {
                    ready(Ok("done"))
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = Cell::new(0u32);
        let result: Result<()> = executor()
            .run("op", || {
                calls.set(calls.get() + 1);
                ready(Err(not_found()))
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.get(), 1);
        assert!(matches!(err, ReconcileError::Provider { .. }));
        assert!(err.to_string().contains("No such addon"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_wraps_last_error() {
        let calls = Cell::new(0u32);
        let result: Result<()> = executor()
            .run("op", || {
                calls.set(calls.get() + 1);
                ready(Err(ReconcileError::provider(
                    "op",
                    "TooManyRequestsException",
                    format!("attempt {}", calls.get()),
                )))
            })
            .await;

        assert_eq!(calls.get(), 3);
        match result.unwrap_err() {
            ReconcileError::ExhaustedRetries { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(source.to_string().contains("attempt 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_nested_runs_have_independent_budgets() {
        let outer_calls = Cell::new(0u32);
        let inner_calls = Cell::new(0u32);
        let exec = executor();

        let result = exec
            .run("outer", || {
                outer_calls.set(outer_calls.get() + 1);
                let attempt = outer_calls.get();
                let inner_calls = &inner_calls;
                async move {
                    let inner = exec
                        .run("inner", || {
                            inner_calls.set(inner_calls.get() + 1);
                            if inner_calls.get() % 3 == 0 {
                                ready(Ok(()))
                            } else {
                                ready(Err(throttled()))
                            }
                        })
                        .await;
                    if let Err(e) = inner {
                        return Err(e);
                    }
                    if attempt < 2 {
                        Err(throttled())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(outer_calls.get(), 2);
        assert_eq!(inner_calls.get(), 6);
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let exec = RetryExecutor::new(3, Duration::from_secs(1));
        assert_eq!(exec.delay_for(0), Duration::from_secs(1));
        assert_eq!(exec.delay_for(1), Duration::from_secs(2));
        assert_eq!(exec.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        assert_eq!(RetryExecutor::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
