//! Tracing setup. Logs go to `~/.local/state/baudit/baudit.log`; callers fall
//! back to `init_logging_stderr` if that file cannot be opened.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info,baudit=debug,baudit_core=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Location of the log file; creates the state directory.
pub fn log_file_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("baudit")?;
    let state = dirs.get_state_home();
    fs::create_dir_all(&state).with_context(|| format!("create {}", state.display()))?;
    Ok(state.join("baudit.log"))
}

/// Install the global subscriber writing to the log file (append mode).
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file: Arc<File> = Arc::new(
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))?,
    );

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(file)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!(pid = std::process::id(), "baudit logging to {}", path.display());
    Ok(path)
}

/// Install a stderr-only subscriber. A subscriber that is already set is left alone.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
