//! One verification attempt: open, hash, close, commit.

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::bucket::{ObjectStore, StorageError};
use crate::checksum::{self, DigestAlgorithm};
use crate::planner::VerificationTask;
use crate::record_db::{ObjectRecord, RecordStore};
use crate::retry::AttemptError;

use super::VerifySettings;

/// What a successful attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum AttemptOutcome {
    Verified(String),
    Touched,
}

/// Open `key` and hash its body to the end. The stream is closed on return.
pub async fn hash_object<S: ObjectStore>(
    storage: &S,
    key: &str,
    algorithm: DigestAlgorithm,
    chunk_size: usize,
) -> Result<String, StorageError> {
    let mut body = storage.open(key).await?;
    checksum::hash_reader(&mut body, algorithm, chunk_size)
        .await
        .map_err(StorageError::from_io)
}

/// A gate slot is held from before the stream opens until it is closed; the
/// commit happens after the slot is released and only for a fully read body.
pub(super) async fn attempt<S: ObjectStore, R: RecordStore>(
    storage: &S,
    records: &R,
    gate: &Arc<Semaphore>,
    settings: &VerifySettings,
    task: &VerificationTask,
) -> Result<AttemptOutcome, AttemptError> {
    let digest = {
        let _permit = gate.acquire().await.map_err(|_| AttemptError::GateClosed)?;
        if settings.dry_run {
            let body = storage.open(&task.key).await?;
            tracing::info!(key = %task.key, "dry run: opened object");
            drop(body);
            return Ok(AttemptOutcome::Touched);
        }
        tracing::debug!(key = %task.key, size = task.size, "working on object");
        hash_object(storage, &task.key, settings.algorithm, settings.chunk_size).await?
    };

    let record = ObjectRecord {
        key: task.key.clone(),
        size: task.size,
        last_modified: task.last_modified,
        checksum: Some(digest.clone()),
        algorithm: Some(settings.algorithm),
        verified_at: None,
    };
    records.upsert(&record).await.map_err(AttemptError::Commit)?;
    tracing::info!(key = %task.key, checksum = %digest, "checksum recorded");
    Ok(AttemptOutcome::Verified(digest))
}
