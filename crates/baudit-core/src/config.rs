use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::checksum::{DigestAlgorithm, DEFAULT_CHUNK_SIZE};
use crate::planner::WatchPolicy;
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per object (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay_secs: 1.0,
            max_delay_secs: 60,
        }
    }
}

impl RetryConfig {
    /// Rejects sections that would turn backoff off or make it shrink.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if !self.base_delay_secs.is_finite() || self.base_delay_secs <= 0.0 {
            anyhow::bail!(
                "retry.base_delay_secs must be a positive number of seconds (got {})",
                self.base_delay_secs
            );
        }
        if (self.max_delay_secs as f64) < self.base_delay_secs {
            anyhow::bail!(
                "retry.max_delay_secs ({}) must not be below retry.base_delay_secs ({})",
                self.max_delay_secs,
                self.base_delay_secs
            );
        }
        Ok(())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        let fallback = RetryPolicy::default();
        RetryPolicy {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::try_from_secs_f64(cfg.base_delay_secs)
                .unwrap_or(fallback.base_delay),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }
}

/// Which keys take part in timestamp-based re-verification (optional `[policy]` section).
///
/// Keys that were never recorded are always verified; this only decides whether
/// an already-recorded key is re-hashed when its timestamp moves forward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Key prefixes to track. Empty together with `watch_substrings` = track every key.
    #[serde(default)]
    pub watch_prefixes: Vec<String>,
    /// Substrings that mark a key as tracked anywhere in the key.
    #[serde(default)]
    pub watch_substrings: Vec<String>,
    /// Track keys ending in `/` (directory placeholders). Off by default.
    #[serde(default)]
    pub track_directory_markers: bool,
}

/// Audit configuration loaded from `~/.config/baudit/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Bucket to audit.
    pub bucket: String,
    /// Storage endpoint base URL (path-style addressing: `{endpoint}/{bucket}/{key}`).
    pub endpoint: String,
    /// Only list keys under this prefix.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Maximum number of object streams open at once.
    pub concurrency: usize,
    /// Read buffer size used while hashing a body.
    pub chunk_size: usize,
    /// Digest used for new checksums.
    #[serde(default)]
    pub digest: DigestAlgorithm,
    /// Open each selected object but never read, hash, or record it.
    #[serde(default)]
    pub dry_run: bool,
    /// Verify TLS peer certificates and host names.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    /// Checksum database path; defaults to `~/.local/state/baudit/checksums.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional eligibility policy; if missing, every key is tracked.
    #[serde(default)]
    pub policy: Option<PolicyConfig>,
}

fn default_verify_tls() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            endpoint: "https://s3.amazonaws.com".to_string(),
            prefix: None,
            concurrency: 5,
            chunk_size: DEFAULT_CHUNK_SIZE,
            digest: DigestAlgorithm::default(),
            dry_run: false,
            verify_tls: true,
            db_path: None,
            retry: None,
            policy: None,
        }
    }
}

impl AuditConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn watch_policy(&self) -> WatchPolicy {
        self.policy
            .as_ref()
            .map(WatchPolicy::from)
            .unwrap_or_default()
    }

    /// Fails early on settings that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            anyhow::bail!("no bucket configured (set `bucket` in config.toml or pass --bucket)");
        }
        if self.endpoint.trim().is_empty() {
            anyhow::bail!("no storage endpoint configured");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("baudit")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AuditConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` but for an explicit path (`--config`).
pub fn load_or_init_at(path: &Path) -> Result<AuditConfig> {
    if !path.exists() {
        let default_cfg = AuditConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AuditConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
