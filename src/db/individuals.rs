//! Individual repository.
//!
//! Handles registration, lookup and soft deletion of individuals.

use super::constraint::{Constraint, Violation, ViolationKind, violation};
use super::{begin_write, finish, from_unix, unknown};
use crate::error::{StorageError, StorageResult};
use crate::model::{Email, Individual, IndividualRecord, Lifecycle, Username};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info};

type IndividualRow = (i64, String, String, String, i64, i64, Option<i64>);

/// Existence and soft-delete state of one individual, as seen inside a transaction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndividualState {
    pub id: i64,
    pub deleted: bool,
}

/// Repository for individual operations.
pub struct IndividualRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> IndividualRepository<'a> {
    /// Create a new individual repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new active individual.
    ///
    /// Uniqueness violations are reported per field so callers can tell the
    /// user which one is taken.
    pub async fn store(&self, individual: &Individual) -> StorageResult<()> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO individuals (username, email, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(individual.username.as_str())
        .bind(individual.email.as_str())
        .bind(individual.name.as_str())
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(e) => return Err(self.classify_insert_failure(individual, e).await),
        };

        // A single-row insert that affects anything else means corruption.
        if result.rows_affected() != 1 {
            error!(
                rows_affected = result.rows_affected(),
                username = %individual.username,
                "Expected exactly one individual row to be inserted"
            );
            return Err(StorageError::Unknown);
        }

        info!(username = %individual.username, "Individual stored");
        Ok(())
    }

    async fn classify_insert_failure(&self, individual: &Individual, err: sqlx::Error) -> StorageError {
        let Some(Violation {
            kind: ViolationKind::Unique,
            constraint,
        }) = violation(&err)
        else {
            return unknown("insert individual", err);
        };

        debug!(username = %individual.username, error = %err, "Unique violation while storing individual");
        match constraint {
            Some(Constraint::UniqueIndividualUsername) => StorageError::DuplicateUsername,
            Some(Constraint::UniqueIndividualEmail) => StorageError::DuplicateEmail,
            Some(_) => unknown("insert individual", err),
            // Rows are never removed, so the row holding a taken username is
            // still there to be found.
            None => match username_taken(self.pool, &individual.username).await {
                Ok(true) => StorageError::DuplicateUsername,
                Ok(false) => StorageError::DuplicateEmail,
                Err(probe) => unknown("probe username after unique violation", probe),
            },
        }
    }

    /// Fetch an active individual.
    ///
    /// Soft-deleted individuals are reported as `AlreadyDeleted`.
    pub async fn get(&self, username: &Username) -> StorageResult<Individual> {
        let record = self.record(username).await?;
        match record.lifecycle {
            Lifecycle::Active => Ok(record.individual),
            Lifecycle::Deleted { .. } => {
                debug!(username = %username, "Individual is soft-deleted");
                Err(StorageError::AlreadyDeleted)
            }
        }
    }

    /// Fetch the full stored row, including soft-deleted individuals.
    pub async fn record(&self, username: &Username) -> StorageResult<IndividualRecord> {
        let row = sqlx::query_as::<_, IndividualRow>(
            r#"
            SELECT id, username, email, name, created_at, updated_at, deleted_at
            FROM individuals
            WHERE username = ?
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| unknown("fetch individual", e))?;

        let Some((id, username, email, name, created_at, updated_at, deleted_at)) = row else {
            debug!(username = %username, "Individual not found");
            return Err(StorageError::NotFound);
        };

        let lifecycle = match deleted_at {
            Some(at) => Lifecycle::Deleted {
                at: from_unix(at, "individuals.deleted_at")?,
            },
            None => Lifecycle::Active,
        };

        Ok(IndividualRecord {
            id,
            individual: Individual {
                username: Username::from(username),
                email: Email::from_stored(email),
                name,
            },
            created_at: from_unix(created_at, "individuals.created_at")?,
            updated_at: from_unix(updated_at, "individuals.updated_at")?,
            lifecycle,
        })
    }

    /// Soft-delete an individual.
    ///
    /// The conditional update and the follow-up classification run under one
    /// write lock, so a concurrent delete cannot slip between them.
    pub async fn mark_deleted(&self, username: &Username) -> StorageResult<()> {
        let mut tx = begin_write(self.pool).await?;
        let result = mark_deleted_in(&mut tx, username).await;
        finish(tx, result).await?;

        info!(username = %username, "Individual marked as deleted");
        Ok(())
    }
}

async fn mark_deleted_in(conn: &mut SqliteConnection, username: &Username) -> StorageResult<()> {
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        r#"
        UPDATE individuals
        SET deleted_at = ?, updated_at = ?
        WHERE username = ? AND deleted_at IS NULL
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(username.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| unknown("soft-delete individual", e))?;

    match result.rows_affected() {
        1 => Ok(()),
        0 => match lookup(conn, username)
            .await
            .map_err(|e| unknown("look up individual after soft-delete miss", e))?
        {
            None => {
                debug!(username = %username, "Individual not found");
                Err(StorageError::NotFound)
            }
            Some(IndividualState { deleted: true, .. }) => Err(StorageError::AlreadyDeleted),
            Some(IndividualState { deleted: false, .. }) => {
                error!(username = %username, "Active individual was not updated by soft-delete");
                Err(StorageError::Unknown)
            }
        },
        rows => {
            error!(rows_affected = rows, username = %username, "Expected at most one row to be soft-deleted");
            Err(StorageError::Unknown)
        }
    }
}

/// Look up the internal id and deleted state of an individual.
pub(crate) async fn lookup(
    conn: &mut SqliteConnection,
    username: &Username,
) -> Result<Option<IndividualState>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, Option<i64>)>(
        r#"
        SELECT id, deleted_at
        FROM individuals
        WHERE username = ?
        "#,
    )
    .bind(username.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|(id, deleted_at)| IndividualState {
        id,
        deleted: deleted_at.is_some(),
    }))
}

async fn username_taken(pool: &SqlitePool, username: &Username) -> Result<bool, sqlx::Error> {
    let taken: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM individuals WHERE username = ?)")
            .bind(username.as_str())
            .fetch_one(pool)
            .await?;
    Ok(taken != 0)
}
