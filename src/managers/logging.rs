//! Logging manager
//!
//! Console output always goes to stderr so that nothing interferes with
//! tools whose stdout is captured. When a log directory is configured a
//! daily-rotated file is written as well and old files are pruned.

use crate::config::{self, options, ConfigError, Resolver};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "s3-backup";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for rotated log files, console only when unset
    pub log_directory: Option<PathBuf>,
    pub log_level: Level,
    /// Maximum number of log files to keep
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_directory: None,
            log_level: Level::INFO,
            max_files: 10,
        }
    }
}

impl LoggingConfig {
    /// Build from the resolved `log-*` options
    pub fn from_resolver(resolver: &Resolver) -> config::Result<Self> {
        let raw_level = resolver.string(&options::LOG_LEVEL);
        let log_level = parse_level(&raw_level).ok_or_else(|| ConfigError::InvalidValue {
            option: options::LOG_LEVEL.name.to_string(),
            value: raw_level.clone(),
            reason: "expected one of trace, debug, info, warn, error".to_string(),
        })?;

        let max_files = resolver.integer(&options::LOG_MAX_FILES)?;

        Ok(Self {
            log_directory: resolver.path(&options::LOG_DIRECTORY),
            log_level,
            max_files: u32::try_from(max_files).unwrap_or(u32::MAX),
        })
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging with a console layer and an optional file layer
///
/// Returns a guard that must be kept alive for the duration of the program.
/// When the guard is dropped, any remaining logs are flushed to disk.
pub fn init_logging(config: &LoggingConfig) -> config::Result<LogGuard> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .with_level(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(level_filter(config.log_level));

    let mut file_guard = None;
    let file_layer = match config.log_directory {
        Some(ref log_dir) => {
            fs::create_dir_all(log_dir).map_err(|e| ConfigError::InvalidValue {
                option: options::LOG_DIRECTORY.name.to_string(),
                value: log_dir.display().to_string(),
                reason: e.to_string(),
            })?;

            let file_appender = RollingFileAppender::new(
                Rotation::DAILY,
                log_dir,
                format!("{}.log", LOG_FILE_PREFIX),
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guard = Some(guard);

            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true)
                    .with_span_events(FmtSpan::NONE)
                    .with_filter(level_filter(config.log_level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(ref log_dir) = config.log_directory {
        cleanup_old_logs(log_dir, config.max_files);
    }

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// `RUST_LOG` wins over the configured level
fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

/// Remove rotated log files beyond the newest `max_files`
fn cleanup_old_logs(log_dir: &Path, max_files: u32) {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to list log directory {:?}: {}", log_dir, e);
            return;
        }
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(LOG_FILE_PREFIX)
        })
        .collect();

    // Newest first
    log_files.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time.cmp(&a_time)
    });

    for file in log_files.into_iter().skip(max_files as usize) {
        if let Err(e) = fs::remove_file(file.path()) {
            tracing::warn!("Failed to remove old log file {:?}: {}", file.path(), e);
        } else {
            tracing::debug!("Removed old log file: {:?}", file.path());
        }
    }
}

/// Guard that keeps the file writer alive
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}
