//! CLI for the baudit bucket integrity auditor.

mod commands;

use anyhow::Result;
use baudit_core::config::{self, AuditConfig};
use baudit_core::record_db::ChecksumDb;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_audit, run_checksum, run_export, run_plan, run_records};

/// Top-level CLI for baudit.
#[derive(Debug, Parser)]
#[command(name = "baudit")]
#[command(about = "baudit: incremental checksum auditor for S3-style buckets", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/baudit/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Checksum database to use instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Bucket selection; each flag overrides the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Bucket name.
    #[arg(long)]
    pub bucket: Option<String>,

    /// Storage endpoint base URL.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Only audit keys under this prefix.
    #[arg(long)]
    pub prefix: Option<String>,
}

impl TargetArgs {
    fn apply(&self, cfg: &mut AuditConfig) {
        if let Some(bucket) = &self.bucket {
            cfg.bucket = bucket.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            cfg.endpoint = endpoint.clone();
        }
        if let Some(prefix) = &self.prefix {
            cfg.prefix = Some(prefix.clone());
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the bucket, re-hash new and changed objects, record checksums.
    Audit {
        #[command(flatten)]
        target: TargetArgs,

        /// Maximum number of objects fetched at once.
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,

        /// Open each selected object but do not hash or record it.
        #[arg(long)]
        dry_run: bool,
    },

    /// List the bucket and print which keys an audit would verify.
    Plan {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show every stored checksum record.
    Records,

    /// Print every stored checksum record as a JSON array.
    Export,

    /// Hash one object now and print its digest (nothing is recorded).
    Checksum {
        #[command(flatten)]
        target: TargetArgs,

        /// Object key.
        key: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = match &cli.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        if let Some(db) = &cli.db {
            cfg.db_path = Some(db.clone());
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Audit {
                target,
                concurrency,
                dry_run,
            } => {
                target.apply(&mut cfg);
                if let Some(n) = concurrency {
                    cfg.concurrency = n;
                }
                cfg.dry_run |= dry_run;
                let db = open_db(&cfg).await?;
                run_audit(&cfg, db).await?;
            }
            CliCommand::Plan { target } => {
                target.apply(&mut cfg);
                let db = open_db(&cfg).await?;
                run_plan(&cfg, &db).await?;
            }
            CliCommand::Records => run_records(&open_db(&cfg).await?).await?,
            CliCommand::Export => run_export(&open_db(&cfg).await?).await?,
            CliCommand::Checksum { target, key } => {
                target.apply(&mut cfg);
                run_checksum(&cfg, &key).await?;
            }
        }

        Ok(())
    }
}

async fn open_db(cfg: &AuditConfig) -> Result<ChecksumDb> {
    match &cfg.db_path {
        Some(path) => ChecksumDb::open_at(path).await,
        None => ChecksumDb::open_default().await,
    }
}

#[cfg(test)]
mod tests;
