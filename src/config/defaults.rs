//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

pub fn default_env() -> String {
    "dev".to_string()
}

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "hangcounts.db".to_string()
}

pub fn default_max_connections() -> u32 {
    5
}

pub fn default_acquire_timeout() -> u64 {
    5
}

pub fn default_busy_timeout() -> u64 {
    5
}

// =============================================================================
// Session Defaults
// =============================================================================

/// 30 minutes.
pub fn default_idle_timeout() -> u64 {
    30 * 60
}

/// 24 hours.
pub fn default_absolute_timeout() -> u64 {
    24 * 60 * 60
}

pub fn default_cookie_name() -> String {
    crate::session::SESSION_COOKIE_NAME.to_string()
}
