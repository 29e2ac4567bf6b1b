//! Retry handling for store requests.
//!
//! A single bounded retry with a fixed delay, tracked through an explicit
//! state machine so the sampler (and its tests) can see exactly where a
//! request ended up. Structural errors skip the retry entirely.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching { attempt: u32 },
    RetryScheduled { next_attempt: u32 },
    Succeeded,
    FinalFailure,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_millis(500),
        }
    }
}

/// Drives one request through its retry lifecycle.
#[derive(Debug)]
pub struct Retrier {
    policy: RetryPolicy,
    state: FetchState,
    attempt: u32,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: FetchState::Idle,
            attempt: 0,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Start the next attempt, returning its 1-based number.
    pub fn begin(&mut self) -> u32 {
        self.attempt += 1;
        self.state = FetchState::Fetching {
            attempt: self.attempt,
        };
        self.attempt
    }

    pub fn succeed(&mut self) {
        self.state = FetchState::Succeeded;
    }

    /// Record a failure. Returns the delay to wait before retrying, or
    /// `None` when the error is final (structural, or retries exhausted).
    pub fn fail(&mut self, error: &StoreError) -> Option<Duration> {
        if error.is_retryable() && self.attempt <= self.policy.max_retries {
            self.state = FetchState::RetryScheduled {
                next_attempt: self.attempt + 1,
            };
            Some(self.policy.delay)
        } else {
            self.state = FetchState::FinalFailure;
            None
        }
    }
}

/// Run `op`, retrying per the policy on transient failures.
pub async fn run_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut retrier = Retrier::new(policy);
    loop {
        let attempt = retrier.begin();
        match op().await {
            Ok(value) => {
                retrier.succeed();
                return Ok(value);
            }
            Err(error) => match retrier.fail(&error) {
                Some(delay) => {
                    warn!(operation, attempt, %error, "store request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(operation, attempt, %error, "store request failed for good");
                    return Err(error);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> StoreError {
        StoreError::UnexpectedStatus {
            status: 503,
            body: "unavailable".into(),
        }
    }

    fn no_delay() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_state_machine_success_path() {
        let mut retrier = Retrier::new(RetryPolicy::default());
        assert_eq!(retrier.state(), FetchState::Idle);

        assert_eq!(retrier.begin(), 1);
        assert_eq!(retrier.state(), FetchState::Fetching { attempt: 1 });

        retrier.succeed();
        assert_eq!(retrier.state(), FetchState::Succeeded);
    }

    #[test]
    fn test_state_machine_retry_then_final_failure() {
        let mut retrier = Retrier::new(RetryPolicy::default());

        retrier.begin();
        assert!(retrier.fail(&transient()).is_some());
        assert_eq!(retrier.state(), FetchState::RetryScheduled { next_attempt: 2 });

        retrier.begin();
        assert!(retrier.fail(&transient()).is_none());
        assert_eq!(retrier.state(), FetchState::FinalFailure);
    }

    #[test]
    fn test_structural_error_skips_retry() {
        let mut retrier = Retrier::new(RetryPolicy::default());
        retrier.begin();

        let err = StoreError::BadRequest("malformed filter".into());
        assert!(retrier.fail(&err).is_none());
        assert_eq!(retrier.state(), FetchState::FinalFailure);
    }

    #[tokio::test]
    async fn test_run_with_retry_recovers() {
        let calls = AtomicU32::new(0);
        let result = run_with_retry(no_delay(), "count", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(transient())
            } else {
                Ok(42u64)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_with_retry_gives_up_after_one_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u64, _> = run_with_retry(no_delay(), "count", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_with_retry_structural_is_immediate() {
        let calls = AtomicU32::new(0);
        let result: Result<u64, _> = run_with_retry(no_delay(), "fetch", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::UnknownColumn("qpoints".into()))
        })
        .await;

        assert!(result.unwrap_err().is_structural());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
