//! Log setup. The terminal is owned by the UI, so logs go to a file.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "map-editor.log";

/// `MAP_EDITOR_LOG` overrides the log path; `RUST_LOG` the filter
/// (default `info`).
pub fn init() -> Result<()> {
    let path = std::env::var_os("MAP_EDITOR_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
