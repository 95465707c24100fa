//! Retry loop: run an async attempt until success or policy says stop.

use std::future::Future;
use std::time::Duration;

use super::classify;
use super::error::AttemptError;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// One scheduled retry, handed to the `on_backoff` observer before sleeping.
#[derive(Debug)]
pub struct Backoff<'a> {
    /// Attempts made so far (1-based).
    pub tries: u32,
    /// Delay before the next attempt.
    pub wait: Duration,
    pub kind: ErrorKind,
    pub error: &'a AttemptError,
}

/// Final failure after the policy gave up.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub kind: ErrorKind,
    pub error: AttemptError,
}

/// Runs `op` until it succeeds or the retry policy says to stop.
///
/// `op` receives the 1-based attempt number. On retryable failure `on_backoff`
/// is called, then the loop sleeps for the backoff duration and tries again.
pub async fn run_with_retry<T, F, Fut, B>(
    policy: &RetryPolicy,
    mut op: F,
    mut on_backoff: B,
) -> Result<T, Exhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
    B: FnMut(&Backoff<'_>),
{
    let mut attempt = 1u32;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return Err(Exhausted {
                            attempts: attempt,
                            kind,
                            error: e,
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        on_backoff(&Backoff {
                            tries: attempt,
                            wait: d,
                            kind,
                            error: &e,
                        });
                        tokio::time::sleep(d).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}
