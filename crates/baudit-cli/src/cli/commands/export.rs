//! `baudit export` – checksum store as JSON.

use anyhow::Result;
use baudit_core::record_db::ChecksumDb;

pub async fn run_export(db: &ChecksumDb) -> Result<()> {
    println!("{}", db.export_json().await?);
    Ok(())
}
