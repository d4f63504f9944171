//! Logging setup: console output plus a plain-text log file per run.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
}

/// Console-only logging, used by the runner window.
pub fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}

/// `run_YYYYmmdd_HHMMSS` under `log_dir`, without extension.
pub fn run_stem(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("run_{}", Local::now().format("%Y%m%d_%H%M%S")))
}

/// Console plus `<stem>.txt`. Returns the log file path.
pub fn init_run_logging(stem: &Path) -> Result<PathBuf> {
    if let Some(dir) = stem.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    let log_path = stem.with_extension("txt");
    let file = File::create(&log_path)
        .with_context(|| format!("creating log file {}", log_path.display()))?;

    let console = fmt::layer()
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal());
    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Arc::new(file));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(console)
        .with(file_layer)
        .try_init()?;

    Ok(log_path)
}
