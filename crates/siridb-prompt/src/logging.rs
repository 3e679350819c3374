//! Diagnostic logging to a file.
//!
//! The terminal belongs to the console, so nothing is installed unless a log
//! file is configured.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::EnvFilter;

/// Overrides the configured level with a full filter directive.
pub const FILTER_ENV: &str = "SIRIDB_PROMPT_LOG";

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to open log file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid log level '{level}': {message}")]
    Level { level: String, message: String },
    #[error("failed to configure logger: {0}")]
    Configure(String),
}

static INIT: OnceLock<()> = OnceLock::new();

pub fn init(file: Option<&Path>, level: &str) -> Result<(), InitError> {
    let Some(path) = file else {
        return Ok(());
    };
    if INIT.get().is_some() {
        return Ok(());
    }
    let filter = build_env_filter(level)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| InitError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| InitError::Configure(err.to_string()))?;
    INIT.set(()).ok();
    Ok(())
}

fn build_env_filter(level: &str) -> Result<EnvFilter, InitError> {
    if let Ok(filter) = std::env::var(FILTER_ENV) {
        return Ok(EnvFilter::new(filter));
    }
    EnvFilter::try_new(level).map_err(|err| InitError::Level {
        level: level.to_string(),
        message: err.to_string(),
    })
}
