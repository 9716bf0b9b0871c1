use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::env::logging as env_vars;

/// Logging configuration for kurly-store
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: Level,
    /// Optional file path for logging
    pub file_path: Option<PathBuf>,
    /// Whether to use JSON format
    pub json_format: bool,
    /// Whether to use ANSI colors
    pub use_colors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            file_path: None,
            json_format: false,
            use_colors: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.use_colors = enabled;
        self
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level_str) = env::var(env_vars::LOG_LEVEL) {
            config.level = parse_level(&level_str).unwrap_or(Level::WARN);
        }

        if let Ok(file_path) = env::var(env_vars::LOG_FILE) {
            config.file_path = Some(PathBuf::from(file_path));
        }

        if let Ok(json) = env::var(env_vars::LOG_JSON) {
            config.json_format = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        // Disable colors if NO_COLOR is set or stderr is not a terminal
        if env::var(env_vars::NO_COLOR).is_ok() || !atty::is(atty::Stream::Stderr) {
            config.use_colors = false;
        }

        config
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// Initialize logging with the given configuration.
///
/// Logs go to stderr so stdout stays free for command output. When a file is
/// configured the returned guard must be held until exit to flush it.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = LevelFilter::from_level(config.level);

    let stderr_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(config.use_colors)
            .with_level(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    let mut guard = None;
    let file_layer = match &config.file_path {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&directory).with_context(|| {
                format!("Failed to create log directory: {}", directory.display())
            })?;
            let file_name = path
                .file_name()
                .context("Log file path has no file name")?
                .to_os_string();

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);

            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter)
                    .boxed(),
            )
        }
        None => None,
    };

    Registry::default()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        level = ?config.level,
        file_path = ?config.file_path,
        json_format = config.json_format,
        "Logging initialized"
    );

    Ok(guard)
}

/// Initialize logging from environment variables
pub fn init_from_env() -> Result<Option<WorkerGuard>> {
    init_logging(LoggingConfig::from_env())
}

/// Log performance metrics for a finished operation
pub fn log_performance(operation: &str, duration_ms: u64, success: bool) {
    if success {
        tracing::info!(
            operation = operation,
            duration_ms = duration_ms,
            success = success,
            "Operation completed"
        );
    } else {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            success = success,
            "Operation failed"
        );
    }
}
