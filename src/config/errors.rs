use thiserror::Error;

use crate::config::logging::LoggingError;

/// Configuration could not be loaded or applied
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid setting '{setting_name}': {reason}")]
    InvalidSetting {
        setting_name: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Logging(#[from] LoggingError),
}

impl ConfigError {
    pub fn invalid(setting_name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting_name,
            reason: reason.into(),
        }
    }
}
