//! Bounded retry wrapper shared by all activity calls.
//!
//! ## Retry Strategy
//!
//! Every activity call inside one workflow instance is wrapped by the same
//! [`RetryPolicy`]: attempt the call; on failure wait a fixed interval and
//! re-attempt; stop once the maximum attempt count is reached and surface
//! the last error. With the default policy (5 s, 3 attempts) a flaky
//! service gets two more chances over ten seconds before the instance
//! fails.
//!
//! The interval is fixed rather than exponential: the policy value mirrors
//! the orchestration runtime this pipeline was modelled on, where the first
//! retry interval is the only knob. Failures are not classified — a
//! misconfigured credential is retried exactly like a network blip. See
//! DESIGN.md for why that behaviour is kept rather than fixed.

use crate::error::ActivityError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Immutable retry configuration shared across the activity calls of one
/// workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between a failed attempt and the next one.
    pub first_retry_interval: Duration,
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(first_retry_interval: Duration, max_attempts: u32) -> Self {
        Self {
            first_retry_interval,
            max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    /// The source deployment's values: 5000 ms between attempts, 3 attempts.
    fn default() -> Self {
        Self {
            first_retry_interval: Duration::from_millis(5000),
            max_attempts: 3,
        }
    }
}

/// Run `call` under the policy, returning the first success or the last
/// observed error once attempts are exhausted.
///
/// `step` is only used for log context.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    step: &'static str,
    mut call: F,
) -> Result<T, ActivityError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ActivityError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_err: Option<ActivityError> = None;

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            sleep(policy.first_retry_interval).await;
        }

        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    step,
                    attempt,
                    max_attempts,
                    error = %e,
                    "activity attempt failed"
                );
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or(ActivityError::Configuration {
        detail: "retry wrapper invoked with zero attempts".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(10), 3)
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_does_not_sleep() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(&policy(), "extract", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ActivityError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_then_success_returns_value() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(&policy(), "summarize", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ActivityError::Service {
                        service: "completion",
                        detail: "503".into(),
                    })
                } else {
                    Ok("summary")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "summary");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_surface_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(&policy(), "persist", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(ActivityError::Store {
                    detail: format!("attempt {n}"),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ActivityError::Store { detail }) => assert_eq!(detail, "attempt 2"),
            other => panic!("expected last store error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_attempts_behaves_as_one() {
        let policy = RetryPolicy::new(Duration::from_millis(10), 0);
        let calls = AtomicU32::new(0);
        let _ = call_with_retry(&policy, "extract", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ActivityError::MissingContent) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_policy_matches_source_deployment() {
        let p = RetryPolicy::default();
        assert_eq!(p.first_retry_interval, Duration::from_millis(5000));
        assert_eq!(p.max_attempts, 3);
    }
}
