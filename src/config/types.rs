//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_absolute_timeout, default_acquire_timeout, default_busy_timeout, default_cookie_name,
    default_database_path, default_env, default_idle_timeout, default_max_connections,
};

/// Environment variable selecting the deployment environment.
pub const ENV_VAR_ENV: &str = "HANGCOUNTS_ENV";
/// Environment variable overriding `database.path`.
pub const ENV_VAR_DATABASE_PATH: &str = "HANGCOUNTS_DATABASE_PATH";
/// Environment variable overriding `database.show_config`.
pub const ENV_VAR_SHOW_CONFIG: &str = "HANGCOUNTS_DATABASE_SHOW_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Deployment environment, `"dev"` or `"prod"`.
    #[serde(default = "default_env")]
    pub env: String,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session expiry configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: default_env(),
            database: DatabaseConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(env) = lookup(ENV_VAR_ENV) {
            self.env = env;
        }
        if let Some(path) = lookup(ENV_VAR_DATABASE_PATH) {
            self.database.path = path;
        }
        if let Some(show) = lookup(ENV_VAR_SHOW_CONFIG) {
            self.database.show_config = show == "true";
        }
        self
    }

    pub fn is_production(&self) -> bool {
        self.env == "prod"
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Upper bound on pooled connections for file databases.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before failing.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// Seconds SQLite waits on a locked database before reporting busy.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
    /// Log the effective pool configuration at startup.
    #[serde(default)]
    pub show_config: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            busy_timeout_secs: default_busy_timeout(),
            show_config: false,
        }
    }
}

/// Session expiry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity after which a session expires.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Seconds after creation after which a session expires regardless of activity.
    #[serde(default = "default_absolute_timeout")]
    pub absolute_timeout_secs: u64,
    /// Name of the cookie carrying the session id.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            absolute_timeout_secs: default_absolute_timeout(),
            cookie_name: default_cookie_name(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.env, "dev");
        assert_eq!(config.database.path, "hangcounts.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.session.cookie_name, "session_id");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            env = "prod"

            [database]
            path = "/var/lib/hangcounts/data.db"
            max_connections = 8
            acquire_timeout_secs = 2
            busy_timeout_secs = 3
            show_config = true

            [session]
            idle_timeout_secs = 60
            absolute_timeout_secs = 600
            cookie_name = "hc"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert!(config.is_production());
        assert_eq!(config.database.path, "/var/lib/hangcounts/data.db");
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.database.acquire_timeout_secs, 2);
        assert_eq!(config.database.busy_timeout_secs, 3);
        assert!(config.database.show_config);
        assert_eq!(config.session.idle_timeout_secs, 60);
        assert_eq!(config.session.absolute_timeout_secs, 600);
        assert_eq!(config.session.cookie_name, "hc");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(matches!(
            Config::parse("[logging]\nformat = \"xml\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_VAR_ENV, "prod"),
            (ENV_VAR_DATABASE_PATH, "/tmp/override.db"),
            (ENV_VAR_SHOW_CONFIG, "true"),
        ]);
        let config = Config::default().with_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.env, "prod");
        assert_eq!(config.database.path, "/tmp/override.db");
        assert!(config.database.show_config);
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let config = Config::default().with_overrides(|_| Some(String::new()));
        assert_eq!(config.env, "dev");
        assert_eq!(config.database.path, "hangcounts.db");
    }
}
