//! `baudit plan` – show what an audit would verify without fetching anything.

use anyhow::Result;
use baudit_core::audit;
use baudit_core::bucket::S3Client;
use baudit_core::config::AuditConfig;
use baudit_core::record_db::ChecksumDb;

pub async fn run_plan(cfg: &AuditConfig, db: &ChecksumDb) -> Result<()> {
    cfg.validate()?;
    let client = S3Client::from_config(cfg)?;
    let plan = audit::build_plan(&client, db, &cfg.watch_policy()).await?;

    for task in &plan.tasks {
        println!("{:<12} {}", task.size, task.key);
    }
    let s = &plan.summary;
    println!(
        "listed {}, new {}, stale {}, unchanged {}, excluded {}",
        s.listed, s.new, s.stale, s.unchanged, s.excluded
    );
    Ok(())
}
