pub mod database;
pub mod env_provider;
pub mod errors;
pub mod logging;
pub mod settings;

pub use database::{init_database, migrate_database};
#[cfg(test)]
pub use env_provider::MockEnvironment;
pub use env_provider::{EnvironmentProvider, SystemEnvironment};
pub use errors::ConfigError;
pub use logging::{init_logging, LoggingConfig};
pub use settings::Settings;
