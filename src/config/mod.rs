//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions, TOML loading and environment overrides
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup validation reporting every problem at once

mod defaults;
mod types;
mod validation;

pub use types::{
    Config, ConfigError, DatabaseConfig, ENV_VAR_DATABASE_PATH, ENV_VAR_ENV, ENV_VAR_SHOW_CONFIG,
    LogFormat, LoggingConfig, SessionConfig,
};
pub use validation::{ValidationError, validate};
