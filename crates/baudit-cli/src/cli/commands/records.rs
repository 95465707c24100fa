//! `baudit records` – tabular dump of the checksum store.

use anyhow::Result;
use baudit_core::record_db::ChecksumDb;

pub async fn run_records(db: &ChecksumDb) -> Result<()> {
    let records = db.list_records().await?;
    if records.is_empty() {
        println!("No records in database.");
        return Ok(());
    }
    println!(
        "{:<34} {:<7} {:<12} {:<18} {}",
        "CHECKSUM", "ALGO", "SIZE", "LAST_MODIFIED", "KEY"
    );
    for r in records {
        let algo = r.algorithm.map(|a| a.as_str()).unwrap_or("-");
        println!(
            "{:<34} {:<7} {:<12} {:<18.3} {}",
            r.checksum.as_deref().unwrap_or("-"),
            algo,
            r.size,
            r.last_modified,
            r.key
        );
    }
    Ok(())
}
