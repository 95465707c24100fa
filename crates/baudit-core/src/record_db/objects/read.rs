//! Record read operations: snapshot, get, count, JSON export.

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::super::db::ChecksumDb;
use super::super::types::ObjectRecord;
use crate::checksum::DigestAlgorithm;

fn record_from_row(row: &SqliteRow) -> ObjectRecord {
    let size: i64 = row.get("size");
    let algorithm: Option<String> = row.get("algorithm");
    ObjectRecord {
        key: row.get("key"),
        size: size.max(0) as u64,
        last_modified: row.get("last_modified"),
        checksum: row.get("checksum"),
        algorithm: algorithm.and_then(|name| name.parse::<DigestAlgorithm>().ok()),
        verified_at: row.get("verified_at"),
    }
}

impl ChecksumDb {
    /// All records, ordered by key.
    pub async fn list_records(&self) -> Result<Vec<ObjectRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT key, size, last_modified, checksum, algorithm, verified_at
            FROM objects
            ORDER BY key ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Fetch the record for a single key.
    pub async fn get(&self, key: &str) -> Result<Option<ObjectRecord>> {
        let row = sqlx::query(
            r#"
            SELECT key, size, last_modified, checksum, algorithm, verified_at
            FROM objects
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM objects")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// All records as a pretty-printed JSON array, ordered by key.
    pub async fn export_json(&self) -> Result<String> {
        let records = self.list_records().await?;
        serde_json::to_string_pretty(&records).context("serialize checksum records")
    }
}
