use std::path::PathBuf;

use serde::Deserialize;

use crate::infrastructure::auth::{ThrottlePolicy, TokenConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub throttle: ThrottlePolicy,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where user records and user data live
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Name of the users table in the record store
    pub users_table: String,
    /// Directory under which per-user data directories are created
    pub data_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_table: "users".to_string(),
            data_root: PathBuf::from("data/users"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("AUTHGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.token.ttl_hours, 24);
        assert_eq!(config.throttle.max_attempts, 3);
        assert_eq!(config.throttle.window_minutes, 1);
        assert_eq!(config.throttle.lock_minutes, 15);
        assert_eq!(config.storage.users_table, "users");
        assert_eq!(config.logging.level, "info");
    }
}
