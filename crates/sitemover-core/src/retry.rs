// ── Retried remote calls ──
//
// Every remote call goes through `RetryPolicy::run`. A call result is first
// classified into a `CallOutcome`; transient failures are retried up to the
// attempt budget with no backoff, everything else returns immediately.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::remote::ApiError;

/// Classification of a single remote call.
#[derive(Debug)]
pub enum CallOutcome<T> {
    Success(T),
    /// Transport failure or unstructured/5xx response.
    Retryable(String),
    /// Authentication, malformed body, or a structured business error.
    Fatal(ApiError),
    /// Create refused because the name is taken.
    DuplicateName(String),
}

impl<T> From<Result<T, ApiError>> for CallOutcome<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(ApiError::DuplicateName { message }) => Self::DuplicateName(message),
            Err(err) if err.is_transient() => Self::Retryable(err.to_string()),
            Err(err) => Self::Fatal(err),
        }
    }
}

/// Result of a retried call that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    DuplicateName(String),
}

/// Fixed attempt budget, no backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 4 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `call` until it succeeds, fails fatally, reports a duplicate
    /// name, or the budget runs out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<Outcome<T>, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut last_reason = String::new();

        for attempt in 1..=self.max_attempts {
            match CallOutcome::from(call().await) {
                CallOutcome::Success(value) => {
                    if attempt > 1 {
                        debug!("{operation} succeeded on attempt {attempt}");
                    }
                    return Ok(Outcome::Done(value));
                }
                CallOutcome::DuplicateName(message) => return Ok(Outcome::DuplicateName(message)),
                CallOutcome::Fatal(err) => return Err(CoreError::from_api(operation, err)),
                CallOutcome::Retryable(reason) => {
                    warn!(
                        "{operation} failed attempt {attempt} of {}: {reason}",
                        self.max_attempts
                    );
                    last_reason = reason;
                }
            }
        }

        Err(CoreError::RetriesExhausted {
            operation: operation.to_owned(),
            attempts: self.max_attempts,
            reason: last_reason,
        })
    }

    /// Like [`run`](Self::run) for calls that never create anything: a
    /// duplicate-name answer is unexpected and treated as fatal.
    pub async fn call<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.run(operation, call).await? {
            Outcome::Done(value) => Ok(value),
            Outcome::DuplicateName(message) => Err(CoreError::Remote {
                operation: operation.to_owned(),
                message: format!("duplicate name: {message}"),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn unavailable() -> ApiError {
        ApiError::Api {
            status: 503,
            message: "unavailable".into(),
            code: None,
            structured: false,
        }
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::default();

        let outcome = policy
            .run("fetch root", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n < 3 { Err(unavailable()) } else { Ok(7) } }
            })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Done(7));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(4);

        let err = policy
            .run("fetch root", || {
                calls.set(calls.get() + 1);
                async { Err::<(), _>(unavailable()) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.get(), 4);
        assert!(matches!(err, CoreError::RetriesExhausted { attempts: 4, .. }));
    }

    #[tokio::test]
    async fn fatal_errors_abort_immediately() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::default();

        let err = policy
            .run("create site", || {
                calls.set(calls.get() + 1);
                async {
                    Err::<(), _>(ApiError::Api {
                        status: 400,
                        message: "bad parent".into(),
                        code: Some("INVALID".into()),
                        structured: true,
                    })
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert!(matches!(err, CoreError::Remote { .. }));
    }

    #[tokio::test]
    async fn duplicate_name_is_not_retried() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::default();

        let outcome = policy
            .run("create site", || {
                calls.set(calls.get() + 1);
                async {
                    Err::<(), _>(ApiError::DuplicateName {
                        message: "duplicate".into(),
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(outcome, Outcome::DuplicateName("duplicate".into()));
    }
}
