//! Timeout guard and bounded retry for external calls
//!
//! Every remote suspension point (identity creation, balance read, transfer,
//! strategy execution) goes through `guard`, which races the operation
//! against a deadline. A timeout abandons the orchestrator's wait only; the
//! underlying remote work is not cancelled, and a late result must be
//! discarded by the caller, never reapplied to state.
//!
//! `guard_with_retry` adds bounded retry with exponential backoff for
//! transient failures (timeouts and network errors). Validation and fatal
//! errors are never retried.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, RotorError};

/// Bounded retry policy for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum re-invocations after the first attempt (0 = no retry)
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt
    pub base_delay: Duration,
    /// Cap on the backoff delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries, for callers that handle failures per item.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff delay for the given attempt (1-based), doubling and capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Race `operation` against `bound`.
///
/// On expiry the wait is abandoned and a `Timeout` error carrying `label`
/// and the bound is returned for diagnostics. The guard does not retry;
/// callers decide whether to re-invoke.
pub async fn guard<T, F>(operation: F, bound: Duration, label: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(bound, operation).await {
        Ok(result) => result,
        Err(_) => Err(RotorError::Timeout {
            label: label.to_string(),
            bound_ms: bound.as_millis() as u64,
        }),
    }
}

/// Guard with bounded retry for transient failures.
///
/// `make_operation` is invoked once per attempt; each attempt gets the full
/// `bound`. Non-transient errors return immediately.
pub async fn guard_with_retry<T, F, Fut>(
    mut make_operation: F,
    bound: Duration,
    label: &str,
    policy: &RetryPolicy,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match guard(make_operation(), bound, label).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    label,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_guard_passes_through_success() {
        let result = guard(async { Ok(7) }, Duration::from_secs(1), "op").await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_guard_passes_through_error() {
        let result: Result<()> = guard(
            async { Err(RotorError::Network("down".into())) },
            Duration::from_secs(1),
            "op",
        )
        .await;
        assert!(matches!(result, Err(RotorError::Network(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_times_out_with_label_and_bound() {
        let result: Result<()> = guard(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            Duration::from_millis(30_000),
            "collect:balance",
        )
        .await;

        match result {
            Err(RotorError::Timeout { label, bound_ms }) => {
                assert_eq!(label, "collect:balance");
                assert_eq!(bound_ms, 30_000);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
        };

        let result = guard_with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(RotorError::Network("flaky".into()))
                    } else {
                        Ok(n)
                    }
                }
            },
            Duration::from_secs(1),
            "transfer",
            &policy,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };

        let result: Result<()> = guard_with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RotorError::Network("still down".into())) }
            },
            Duration::from_secs(1),
            "transfer",
            &policy,
        )
        .await;

        assert!(matches!(result, Err(RotorError::Network(_))));
        // 1 initial attempt + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_never_reinvokes_validation_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<()> = guard_with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RotorError::Validation("bad input".into())) }
            },
            Duration::from_secs(1),
            "transfer",
            &policy,
        )
        .await;

        assert!(matches!(result, Err(RotorError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(4), Duration::from_millis(350));
    }

    #[test]
    fn test_policy_none_disables_retry() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_retries, 0);
    }
}
