//! Shared logging utilities for dqmetrics binaries.
//!
//! Console output always goes to stderr. When a log directory is supplied,
//! the same events are appended to a dated file in that directory.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::Result;
use crate::error::DqError;

/// Prefix for dated log file names.
pub const LOG_FILE_PREFIX: &str = "dq_metrics";

/// Maps CLI verbosity flags to a tracing level.
///
/// `quiet` wins over any verbosity count.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Returns the log file path for the given day, e.g. `logs/dq_metrics_2026_02_05.log`.
pub fn log_file_path(log_dir: &Path, date: chrono::NaiveDate) -> PathBuf {
    log_dir.join(format!(
        "{}_{}.log",
        LOG_FILE_PREFIX,
        date.format("%Y_%m_%d")
    ))
}

/// Initializes structured logging based on verbosity level.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
/// * `log_dir` - Optional directory for an appended, dated log file
///
/// # Example
/// ```rust,no_run
/// use dqmetrics_core::logging::init_logging;
///
/// init_logging(1, false, None).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> Result<()> {
    let level = LevelFilter::from_level(level_for(verbose, quiet));

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let file = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| DqError::io("create log directory", dir, e))?;
            let path = log_file_path(dir, chrono::Local::now().date_naive());
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| DqError::io("open log file", &path, e))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(handle))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(level)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| DqError::configuration(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}
