//! Types used by the checksum record store.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::checksum::DigestAlgorithm;

/// Last audited state of one bucket object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub key: String,
    pub size: u64,
    /// Object mtime the checksum corresponds to (Unix seconds).
    pub last_modified: f64,
    /// Lowercase hex digest; `None` until the object has been hashed.
    pub checksum: Option<String>,
    pub algorithm: Option<DigestAlgorithm>,
    /// When the record was last written (Unix seconds). Set by the store.
    #[serde(default)]
    pub verified_at: Option<i64>,
}

/// Upsert-by-key record storage the verifier commits into.
pub trait RecordStore: Send + Sync + 'static {
    /// Insert or replace the record for `record.key`. Size, timestamp, and
    /// checksum are written together.
    fn upsert(&self, record: &ObjectRecord) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Every stored record, for snapshotting prior state.
    fn all_records(&self) -> impl Future<Output = anyhow::Result<Vec<ObjectRecord>>> + Send;
}
