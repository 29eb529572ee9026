#[cfg(test)]
use std::collections::HashMap;

/// Trait for providing environment variable access
///
/// Settings are read through this trait so tests can inject variables
/// without touching the process environment shared by parallel tests.
pub trait EnvironmentProvider: Send + Sync {
    fn get_var(&self, key: &str) -> Option<String>;

    /// Value of `key`, treating a blank value as unset
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get_var(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Production environment provider that reads from system environment
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Test environment provider with configurable variables
#[cfg(test)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

#[cfg(test)]
impl MockEnvironment {
    pub fn empty() -> Self {
        Self { vars: HashMap::new() }
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_vars(mut self, vars: &[(&str, &str)]) -> Self {
        for (key, value) in vars {
            self.vars.insert(key.to_string(), value.to_string());
        }
        self
    }
}

#[cfg(test)]
impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_environment_provider() {
        let provider = MockEnvironment::empty()
            .with_var("DATABASE_URL", "sqlite::memory:")
            .with_vars(&[("LOG_LEVEL", "debug"), ("TOKEN_KEY_FILE", "/tmp/key")]);

        assert_eq!(provider.get_var("DATABASE_URL"), Some("sqlite::memory:".to_string()));
        assert_eq!(provider.get_var("LOG_LEVEL"), Some("debug".to_string()));
        assert_eq!(provider.get_var("PASSWORD_PEPPER"), None);
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let provider = MockEnvironment::empty()
            .with_var("PASSWORD_PEPPER", "   ")
            .with_var("APP_LOG_FILE", " logs/app.log ");

        assert_eq!(provider.get_non_empty("PASSWORD_PEPPER"), None);
        assert_eq!(provider.get_non_empty("APP_LOG_FILE"), Some("logs/app.log".to_string()));
    }
}
