//! Retry and backoff policy for per-object verification attempts.
//!
//! Each failure is classified once into an `ErrorKind`; its `FailureClass`
//! (suppressed, retryable, fatal) drives the backoff decision.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status, classify_io_error};
pub use error::AttemptError;
pub use policy::{ErrorKind, FailureClass, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, Backoff, Exhausted};
