use std::path::{Path, PathBuf};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::EnvironmentProvider;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration for application logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_level: String,
    pub app_log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            app_log_file: None,
        }
    }
}

impl LoggingConfig {
    /// Read `LOG_LEVEL` and `APP_LOG_FILE`
    pub fn from_env_provider(env_provider: &dyn EnvironmentProvider) -> Self {
        Self {
            log_level: env_provider
                .get_non_empty("LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            app_log_file: env_provider.get_non_empty("APP_LOG_FILE").map(PathBuf::from),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("File system error: {0}")]
    FileSystemError(#[from] std::io::Error),
}

/// Install the global tracing subscriber: console output plus an optional
/// daily-rolling log file. Called once by the binary; library code only emits.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| LoggingError::InvalidLogLevel(format!("{}: {}", config.log_level, e)))?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone());

    let subscriber = tracing_subscriber::registry().with(console_layer);

    match &config.app_log_file {
        Some(log_file_path) => {
            let directory = log_file_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(directory)?;

            let file_name = log_file_path
                .file_name()
                .ok_or_else(|| LoggingError::InitializationError("Invalid log file path".to_string()))?;
            let file_appender = tracing_appender::rolling::daily(directory, file_name);

            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_target(true)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter);

            subscriber
                .with(file_layer)
                .try_init()
                .map_err(|e| LoggingError::InitializationError(e.to_string()))
        }
        None => subscriber
            .try_init()
            .map_err(|e| LoggingError::InitializationError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::from_env_provider(&MockEnvironment::empty());
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_logging_from_env() {
        let env = MockEnvironment::empty()
            .with_var("LOG_LEVEL", "rolekeeper_backend=debug")
            .with_var("APP_LOG_FILE", "logs/rolekeeper.log");

        let config = LoggingConfig::from_env_provider(&env);

        assert_eq!(config.log_level, "rolekeeper_backend=debug");
        assert_eq!(config.app_log_file, Some(PathBuf::from("logs/rolekeeper.log")));
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LoggingConfig {
            log_level: "rolekeeper=verbose".to_string(),
            app_log_file: None,
        };
        assert!(matches!(init_logging(&config), Err(LoggingError::InvalidLogLevel(_))));
    }
}
