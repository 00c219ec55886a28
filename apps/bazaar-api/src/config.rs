//! API configuration module.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults ([`Settings::default`])
//! 2. `bazaar.toml` in the working directory (optional)
//! 3. `BAZAAR_*` environment variables, `__` between sections
//!    (`BAZAAR_HTTP__PORT=9000`, `BAZAAR_DATABASE__PATH=/data/bazaar.db`)

use std::path::PathBuf;
use std::time::Duration;

use bazaar_core::DEFAULT_PAGE_LIMIT;
use bazaar_db::DbConfig;
use serde::{Deserialize, Serialize};

/// API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub http: HttpSettings,
    pub database: DatabaseSettings,
    pub list: ListSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file
    pub path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Also the busy timeout checkout transactions wait for the write lock
    pub connect_timeout_secs: u64,
}

/// Page sizes for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSettings {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("bazaar.db"),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for ListSettings {
    fn default() -> Self {
        ListSettings {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: 100,
        }
    }
}

impl Settings {
    /// Load configuration from defaults, `bazaar.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("bazaar").required(false))
            .add_source(
                config::Environment::with_prefix("BAZAAR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".to_string()));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue("database.min_connections".to_string()));
        }
        if self.list.default_limit == 0 || self.list.default_limit > self.list.max_limit {
            return Err(ConfigError::InvalidValue("list.default_limit".to_string()));
        }
        Ok(())
    }

    /// Database configuration for [`bazaar_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.list.default_limit, 10);
    }

    #[test]
    fn test_rejects_default_limit_above_max() {
        let mut settings = Settings::default();
        settings.list.default_limit = 500;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue(ref key)) if key == "list.default_limit"
        ));
    }

    #[test]
    fn test_db_config_carries_pool_settings() {
        let mut settings = Settings::default();
        settings.database.max_connections = 9;
        settings.database.connect_timeout_secs = 3;

        let db = settings.db_config();
        assert_eq!(db.max_connections, 9);
        assert_eq!(db.connect_timeout, Duration::from_secs(3));
        assert!(!db.in_memory);
    }
}
