//! File logging
//!
//! The terminal belongs to the TUI, so log output goes to
//! `<config dir>/chfile-tui.log`. `RUST_LOG` overrides the default filter.

use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";
const LOG_FILE_NAME: &str = "chfile-tui.log";

pub fn log_path(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE_NAME)
}

/// Install the global subscriber, appending to the log file in `dir`
pub fn init(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = log_path(dir);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::rfc_3339())
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

    tracing::info!(path = %path.display(), "logging initialised");
    Ok(path)
}
