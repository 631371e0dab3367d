//! hangcounts - storage service bootstrap.
//!
//! Loads configuration, opens and migrates the database, then holds it open
//! until interrupted.

use hangcounts::Database;
use hangcounts::config::{Config, LogFormat, validate};
use hangcounts::session::SessionManager;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hangcounts.toml".to_string());

    let config = if Path::new(&config_path).exists() {
        Some(Config::load(&config_path)?)
    } else {
        None
    };
    let loaded = config.is_some();
    let config = config.unwrap_or_default().with_env_overrides();

    init_tracing(config.logging.format);

    if !loaded {
        warn!(path = %config_path, "Config file not found, using defaults");
    }

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s)",
            errors.len()
        ));
    }

    info!(
        env = %config.env,
        production = config.is_production(),
        database = %config.database.path,
        "Starting hangcounts"
    );

    let db = Database::connect(&config.database).await?;
    let sessions = SessionManager::from_config(Arc::new(db.clone()), &config.session);
    info!(
        cookie = sessions.cookie_name(),
        idle_timeout_secs = config.session.idle_timeout_secs,
        absolute_timeout_secs = config.session.absolute_timeout_secs,
        "Session lifecycle ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    db.close().await;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
