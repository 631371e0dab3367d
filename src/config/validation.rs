//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("env must be \"dev\" or \"prod\", got {0:?}")]
    InvalidEnv(String),
    #[error("database.path is required")]
    MissingDatabasePath,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("database.max_connections must be at least 1")]
    NoConnections,
    #[error("session.idle_timeout_secs ({idle}) exceeds session.absolute_timeout_secs ({absolute})")]
    IdleExceedsAbsolute { idle: u64, absolute: u64 },
    #[error("session.cookie_name is required")]
    MissingCookieName,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.env != "dev" && config.env != "prod" {
        errors.push(ValidationError::InvalidEnv(config.env.clone()));
    }

    // Database path validation
    let db = &config.database;
    if db.path.trim().is_empty() {
        errors.push(ValidationError::MissingDatabasePath);
    } else if db.path != ":memory:" {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }
    if db.max_connections == 0 {
        errors.push(ValidationError::NoConnections);
    }

    let session = &config.session;
    if session.idle_timeout_secs > session.absolute_timeout_secs {
        errors.push(ValidationError::IdleExceedsAbsolute {
            idle: session.idle_timeout_secs,
            absolute: session.absolute_timeout_secs,
        });
    }
    if session.cookie_name.trim().is_empty() {
        errors.push(ValidationError::MissingCookieName);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate(&Config::default()), Ok(()));
    }

    #[test]
    fn in_memory_database_is_valid() {
        let mut config = Config::default();
        config.database.path = ":memory:".to_string();
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = Config::default();
        config.env = "staging".to_string();
        config.database.path = "/definitely/not/a/real/dir/hc.db".to_string();
        config.database.max_connections = 0;
        config.session.idle_timeout_secs = 100;
        config.session.absolute_timeout_secs = 10;
        config.session.cookie_name = " ".to_string();

        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidEnv("staging".to_string()),
                ValidationError::DatabasePathInvalid("/definitely/not/a/real/dir/hc.db".to_string()),
                ValidationError::NoConnections,
                ValidationError::IdleExceedsAbsolute {
                    idle: 100,
                    absolute: 10
                },
                ValidationError::MissingCookieName,
            ]
        );
    }

    #[test]
    fn empty_path_is_reported() {
        let mut config = Config::default();
        config.database.path = String::new();
        assert_eq!(
            validate(&config),
            Err(vec![ValidationError::MissingDatabasePath])
        );
    }
}
