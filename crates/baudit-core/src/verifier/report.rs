//! Outcome of one verification run.

use crate::retry::ErrorKind;

/// A task that gave up (retries exhausted, fatal error, or a panicked worker).
/// Its record is untouched. `attempts` is 0 when the worker aborted.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub key: String,
    pub attempts: u32,
    pub kind: ErrorKind,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Tasks handed to the pool.
    pub selected: usize,
    /// Objects hashed and committed.
    pub verified: usize,
    /// Objects opened in dry-run mode (nothing read or written).
    pub touched: usize,
    pub failed: Vec<TaskFailure>,
    /// Failed attempts classed as benign transport noise (TLS verification).
    pub suppressed_transport_errors: usize,
    /// Worker tasks that panicked or were cancelled; each is also in `failed`.
    pub aborted: usize,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.verified + self.touched
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.aborted == 0
    }
}
