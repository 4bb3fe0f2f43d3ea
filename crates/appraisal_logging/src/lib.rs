//! Shared logging setup for Appraisal binaries.
//!
//! Logs go to stderr and to a daily-rolling file under the log directory.
//! `RUST_LOG` overrides the default filter for both.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "appraisal=info,appraisal_db=info";
const VERBOSE_LOG_FILTER: &str = "appraisal=debug,appraisal_db=debug";

/// Logging configuration shared by Appraisal binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Directory for the rolling log file; `None` logs to stderr only
    pub log_dir: Option<PathBuf>,
}

/// Keeps the background file writer alive. Drop it last, at exit, so buffered
/// lines are flushed.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize tracing with stderr output and, when a log directory is
/// configured, a non-blocking rolling file writer.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogGuard> {
    let filter = build_filter(config.verbose);

    let (file_layer, file_guard) = match config.log_dir {
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
            let appender =
                tracing_appender::rolling::daily(&dir, format!("{}.log", sanitize_name(config.app_name)));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter.clone());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: file_guard })
}

fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        })
    })
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("appraisal"), "appraisal");
        assert_eq!(sanitize_name("app raisal/v2"), "app_raisal_v2");
    }

    #[test]
    fn test_init_creates_log_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("logs");

        let guard = init_logging(LogConfig {
            app_name: "appraisal-test",
            verbose: true,
            log_dir: Some(dir.clone()),
        })
        .unwrap();
        tracing::info!("logging initialized");
        drop(guard);

        assert!(dir.is_dir());
    }
}
