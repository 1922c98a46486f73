//! File-based tracing setup. The TUI owns the terminal, so logs never go to stderr.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "ytsp.log";
const FILTER_ENV: &str = "YTSP_LOG";

fn default_log_dir() -> PathBuf {
  ProjectDirs::from("", "", "ytsp").map(|d| d.data_local_dir().join("logs")).unwrap_or_else(std::env::temp_dir)
}

/// Install the global subscriber. Keep the returned guard alive for the
/// whole run or buffered events are lost.
pub fn init_tracing(log_dir: Option<PathBuf>) -> Result<(WorkerGuard, PathBuf)> {
  let dir = log_dir.unwrap_or_else(default_log_dir);
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;

  let filter = EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("ytsp=info"));
  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

  Ok((guard, dir.join(LOG_FILE)))
}
