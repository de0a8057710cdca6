//! Application logging functionality
//!
//! Logs go to stderr, filtered by `RUST_LOG`. When the logs directory in the
//! user config directory exists, each run also appends to a dated log file.

use crate::core::config_file::ConfigFile;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Get the file name of today's log file
pub fn current_log_file_name() -> String {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d");
    format!("hangeul-merge-{}.log", timestamp)
}

/// Get the path to the current log file
pub fn current_log_file() -> PathBuf {
    ConfigFile::logs_dir().join(current_log_file_name())
}

/// Initialize the logs directory
pub fn initialize_logs_directory() -> anyhow::Result<()> {
    fs::create_dir_all(ConfigFile::logs_dir())?;
    Ok(())
}

fn default_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn file_writer(dir: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::never(dir, current_log_file_name());
    tracing_appender::non_blocking(appender)
}

/// Install the global subscriber
///
/// Returns the file writer's guard; keep it alive until exit so buffered
/// lines are flushed.
pub fn init(verbose: bool, force_file: bool) -> Option<WorkerGuard> {
    let logs_dir = ConfigFile::logs_dir();
    if force_file {
        if let Err(e) = initialize_logs_directory() {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let (file_layer, guard) = if logs_dir.is_dir() {
        let (writer, guard) = file_writer(&logs_dir);
        let layer = fmt::layer().with_ansi(false).with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    let installed = tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if installed.is_ok() && guard.is_some() {
        tracing::debug!("Logging to {:?}", current_log_file());
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_dated() {
        let name = current_log_file_name();
        assert!(name.starts_with("hangeul-merge-"));
        assert!(name.ends_with(".log"));
        // hangeul-merge-YYYY-MM-DD.log
        assert_eq!(name.len(), "hangeul-merge-".len() + 10 + ".log".len());
    }
}
