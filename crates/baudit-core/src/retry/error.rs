//! Error type for one verification attempt.

use crate::bucket::StorageError;

/// Failure of a single attempt: fetching/reading the object, or committing its record.
/// Kept separate from `anyhow` so the retry loop can classify before giving up.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// Opening or reading the object body failed.
    #[error("{0}")]
    Storage(#[from] StorageError),
    /// The checksum record could not be written.
    #[error("record commit: {0:#}")]
    Commit(anyhow::Error),
    /// The concurrency gate was closed before a slot became free.
    #[error("concurrency gate closed")]
    GateClosed,
}
