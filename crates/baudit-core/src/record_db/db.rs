//! SQLite-backed checksum database: connection setup and schema.
//!
//! Reads and writes of individual records live in `objects`.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upserts from concurrent workers wait this long for the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to the checksum database. Cheap to clone; clones share the pool.
///
/// Default location: `~/.local/state/baudit/checksums.db`.
#[derive(Clone)]
pub struct ChecksumDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl ChecksumDb {
    pub fn default_path() -> Result<PathBuf> {
        let dirs = xdg::BaseDirectories::with_prefix("baudit")?;
        Ok(dirs.get_state_home().join("checksums.db"))
    }

    pub async fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open or create the database file at `path`, creating parent directories.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .with_context(|| format!("open checksum db {}", path.display()))?;

        let db = ChecksumDb { pool };
        db.create_schema().await?;
        tracing::debug!("checksum db ready at {}", path.display());
        Ok(db)
    }

    async fn create_schema(&self) -> Result<()> {
        // last_modified: Unix seconds, REAL for sub-second precision.
        // checksum/algorithm: NULL until the object has been hashed.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS objects (
                key           TEXT PRIMARY KEY NOT NULL,
                size          INTEGER NOT NULL,
                last_modified REAL NOT NULL,
                checksum      TEXT,
                algorithm     TEXT,
                verified_at   INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("create objects table")?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn open_memory() -> Result<ChecksumDb> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = ChecksumDb { pool };
    db.create_schema().await?;
    Ok(db)
}
