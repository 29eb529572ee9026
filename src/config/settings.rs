use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::errors::ConfigError;
use crate::config::logging::LoggingConfig;
use crate::config::{EnvironmentProvider, SystemEnvironment};
use crate::providers::credential_hasher::PEPPER_MIN_LENGTH;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://rolekeeper.db?mode=rwc";
pub const DEFAULT_TOKEN_KEY_FILE: &str = "data/token.key";

/// Process configuration, read once at startup
#[derive(Clone)]
pub struct Settings {
    database_url: String,
    token_key_file: PathBuf,
    password_pepper: Option<String>,
    logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            token_key_file: PathBuf::from(DEFAULT_TOKEN_KEY_FILE),
            password_pepper: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings through `env_provider`
    ///
    /// # Errors
    /// `ConfigError::InvalidSetting` when `PASSWORD_PEPPER` is set but too short
    pub fn from_env_provider(env_provider: Arc<dyn EnvironmentProvider>) -> Result<Self, ConfigError> {
        let database_url = env_provider
            .get_non_empty("DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let token_key_file = env_provider
            .get_non_empty("TOKEN_KEY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_KEY_FILE));

        let password_pepper = env_provider.get_non_empty("PASSWORD_PEPPER");
        if let Some(pepper) = &password_pepper {
            if pepper.chars().count() < PEPPER_MIN_LENGTH {
                return Err(ConfigError::invalid(
                    "PASSWORD_PEPPER",
                    format!("must be at least {} characters", PEPPER_MIN_LENGTH),
                ));
            }
        }

        Ok(Self {
            database_url,
            token_key_file,
            password_pepper,
            logging: LoggingConfig::from_env_provider(env_provider.as_ref()),
        })
    }

    /// Convenience method that uses the system environment provider
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = database_url.into();
        self
    }

    pub fn with_token_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_key_file = path.into();
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn token_key_file(&self) -> &Path {
        &self.token_key_file
    }

    pub fn password_pepper(&self) -> Option<&str> {
        self.password_pepper.as_deref()
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("token_key_file", &self.token_key_file)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "<redacted>"))
            .field("logging", &self.logging)
            .finish()
    }
}
