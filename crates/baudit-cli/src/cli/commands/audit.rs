//! `baudit audit` – list, plan, verify, record.

use anyhow::Result;
use baudit_core::audit;
use baudit_core::bucket::S3Client;
use baudit_core::config::AuditConfig;
use baudit_core::record_db::ChecksumDb;
use baudit_core::verifier::VerifySettings;
use std::sync::Arc;

pub async fn run_audit(cfg: &AuditConfig, db: ChecksumDb) -> Result<()> {
    cfg.validate()?;
    let client = S3Client::from_config(cfg)?;
    tracing::info!(bucket = client.bucket(), dry_run = cfg.dry_run, "starting audit");

    let outcome = audit::run_audit(
        Arc::new(client),
        Arc::new(db),
        &cfg.watch_policy(),
        VerifySettings::from(cfg),
    )
    .await?;

    let report = &outcome.report;
    if cfg.dry_run {
        println!(
            "selected {}, opened {} (dry run), failed {}",
            report.selected,
            report.touched,
            report.failed.len()
        );
    } else {
        println!(
            "selected {}, verified {}, failed {}",
            report.selected,
            report.verified,
            report.failed.len()
        );
    }
    for failure in &report.failed {
        println!(
            "  {} ({:?}, {} attempts): {}",
            failure.key, failure.kind, failure.attempts, failure.error
        );
    }
    if report.suppressed_transport_errors > 0 {
        println!(
            "{} TLS verification error(s) suppressed",
            report.suppressed_transport_errors
        );
    }
    Ok(())
}
