//! Database module for persistent storage.
//!
//! Provides async SQLite database access using SQLx for:
//! - Individuals: registration, lookup and soft deletion
//! - Hangouts and their participant links
//!
//! Every operation with more than one dependent statement runs inside a
//! `BEGIN IMMEDIATE` transaction. SQLite grants the write lock when the
//! transaction starts and holds it until commit or rollback, so no concurrent
//! writer can soft-delete an individual between an existence check and the
//! write that depends on it.

mod constraint;
mod hangouts;
mod individuals;

pub use hangouts::HangoutRepository;
pub use individuals::IndividualRepository;

use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::model::{Hangout, HangoutId, Individual, IndividualRecord, Username};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors raised while opening the database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("database integrity check failed: {0}")]
    Integrity(String),
}

/// Database handle with connection pool.
///
/// Cloning is cheap and shares the pool. The pool lives until [`Database::close`]
/// is called or the last clone is dropped.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Maximum time a file-database connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open a database at `path` with default pool settings.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let config = DatabaseConfig {
            path: path.to_string(),
            ..DatabaseConfig::default()
        };
        Self::connect(&config).await
    }

    /// Open the configured database, running migrations if needed.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let acquire_timeout = Duration::from_secs(config.acquire_timeout_secs);
        let busy_timeout = Duration::from_secs(config.busy_timeout_secs);

        let pool = if config.path == ":memory:" {
            // Each parse yields a uniquely named shared-cache database, so
            // parallel tests never see each other's rows. The database lives
            // as long as one connection does: keep exactly one, forever.
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?
                .foreign_keys(true)
                .busy_timeout(busy_timeout);

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(acquire_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(&config.path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(busy_timeout);

            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(acquire_timeout)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        if config.show_config {
            info!(
                path = %config.path,
                max_connections = config.max_connections,
                acquire_timeout_secs = config.acquire_timeout_secs,
                busy_timeout_secs = config.busy_timeout_secs,
                "Pool configuration"
            );
        }
        info!(path = %config.path, "Database connected");

        Self::run_migrations(&pool).await?;

        let integrity: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&pool)
            .await?;
        if integrity != "ok" {
            error!(integrity_check = %integrity, "Database integrity check failed");
            return Err(DbError::Integrity(integrity));
        }

        Ok(Self { pool })
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection and wait for in-flight operations.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database closed");
    }

    /// Get individual repository.
    pub fn individuals(&self) -> IndividualRepository<'_> {
        IndividualRepository::new(&self.pool)
    }

    /// Get hangout repository.
    pub fn hangouts(&self) -> HangoutRepository<'_> {
        HangoutRepository::new(&self.pool)
    }

    /// Full stored row of an individual, soft-deleted ones included.
    pub async fn individual_record(&self, username: &Username) -> StorageResult<IndividualRecord> {
        self.individuals().record(username).await
    }

    /// Number of participant links stored for a hangout.
    pub async fn participant_count(&self, public_id: &HangoutId) -> StorageResult<usize> {
        self.hangouts().participant_count(public_id).await
    }
}

#[async_trait]
impl Storage for Database {
    async fn store_individual(&self, individual: &Individual) -> StorageResult<()> {
        self.individuals().store(individual).await
    }

    async fn get_individual(&self, username: &Username) -> StorageResult<Individual> {
        self.individuals().get(username).await
    }

    async fn mark_individual_deleted(&self, username: &Username) -> StorageResult<()> {
        self.individuals().mark_deleted(username).await
    }

    async fn store_hangout(&self, hangout: &Hangout) -> StorageResult<()> {
        self.hangouts().store(hangout).await
    }

    async fn get_hangout(&self, public_id: &HangoutId) -> StorageResult<Hangout> {
        self.hangouts().get(public_id).await
    }
}

/// Log an unclassifiable failure with full detail and collapse it to `Unknown`.
pub(crate) fn unknown(context: &'static str, err: impl Display) -> StorageError {
    error!(context = context, error = %err, "Unclassified storage failure");
    StorageError::Unknown
}

/// Begin a transaction holding SQLite's write lock from its first statement.
pub(crate) async fn begin_write(pool: &SqlitePool) -> StorageResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| unknown("begin transaction", e))
}

/// Commit on success, roll back on failure.
///
/// A failed commit is reported as `Unknown`. A failed rollback is only logged,
/// since the operation's outcome is already decided.
pub(crate) async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    result: StorageResult<T>,
) -> StorageResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| unknown("commit transaction", e))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Failed to roll back transaction");
            }
            Err(err)
        }
    }
}

/// Convert a stored unix timestamp in microseconds back into a UTC date.
pub(crate) fn from_unix_micros(micros: i64, column: &'static str) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        error!(column = column, value = micros, "Stored timestamp out of range");
        StorageError::Unknown
    })
}

/// Convert a stored unix timestamp back into a UTC date.
pub(crate) fn from_unix(secs: i64, column: &'static str) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        error!(column = column, value = secs, "Stored timestamp out of range");
        StorageError::Unknown
    })
}
