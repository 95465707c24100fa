//! Record write operations and the `RecordStore` implementation.

use anyhow::Result;

use super::super::db::ChecksumDb;
use super::super::types::{ObjectRecord, RecordStore};

impl ChecksumDb {
    /// Insert or replace the record for `record.key` in a single statement,
    /// so size, timestamp, and checksum always change together.
    pub async fn upsert_record(&self, record: &ObjectRecord) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO objects (key, size, last_modified, checksum, algorithm, verified_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(key) DO UPDATE SET
                size = excluded.size,
                last_modified = excluded.last_modified,
                checksum = excluded.checksum,
                algorithm = excluded.algorithm,
                verified_at = excluded.verified_at
            "#,
        )
        .bind(&record.key)
        .bind(record.size as i64)
        .bind(record.last_modified)
        .bind(&record.checksum)
        .bind(record.algorithm.map(|a| a.as_str()))
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl RecordStore for ChecksumDb {
    async fn upsert(&self, record: &ObjectRecord) -> Result<()> {
        self.upsert_record(record).await
    }

    async fn all_records(&self) -> Result<Vec<ObjectRecord>> {
        self.list_records().await
    }
}
