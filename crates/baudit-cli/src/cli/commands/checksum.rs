//! `baudit checksum <key>` – hash one object on demand.

use anyhow::{Context, Result};
use baudit_core::bucket::S3Client;
use baudit_core::config::AuditConfig;
use baudit_core::verifier::hash_object;

/// Fetch and hash `key`, print `<digest>  <key>`. Nothing is written to the store.
pub async fn run_checksum(cfg: &AuditConfig, key: &str) -> Result<()> {
    cfg.validate()?;
    let client = S3Client::from_config(cfg)?;
    let digest = hash_object(&client, key, cfg.digest, cfg.chunk_size)
        .await
        .with_context(|| format!("hash {}", key))?;
    println!("{}  {}", digest, key);
    Ok(())
}
