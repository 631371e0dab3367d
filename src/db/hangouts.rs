//! Hangout repository.
//!
//! A hangout and all of its participant links are created in one transaction:
//! any failure discards the hangout row along with every link inserted before it.

use super::constraint::{Constraint, Violation, ViolationKind, violation};
use super::individuals::{IndividualState, lookup};
use super::{begin_write, finish, from_unix_micros, unknown};
use crate::error::{StorageError, StorageResult};
use crate::model::{Hangout, HangoutDetails, HangoutId, Minutes, Username};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type HangoutRow = (i64, String, String, Option<String>, i64, i64, String);

/// Repository for hangout operations.
pub struct HangoutRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HangoutRepository<'a> {
    /// Create a new hangout repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a hangout with its full participant set, atomically.
    ///
    /// The creator and every participant must exist and be active when the
    /// transaction runs. The creator is not added to the participants; a
    /// username listed more than once is linked once.
    pub async fn store(&self, hangout: &Hangout) -> StorageResult<()> {
        let mut tx = begin_write(self.pool).await?;
        let result = insert_hangout(&mut tx, hangout).await;
        let linked = finish(tx, result).await?;

        info!(
            public_id = %hangout.public_id,
            creator = %hangout.created_by,
            participants = linked,
            "Hangout created"
        );
        Ok(())
    }

    /// Fetch a hangout and its participants by public id.
    pub async fn get(&self, public_id: &HangoutId) -> StorageResult<Hangout> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| unknown("acquire connection", e))?;

        let row = sqlx::query_as::<_, HangoutRow>(
            r#"
            SELECT h.id, h.public_id, h.location, h.description, h.duration_minutes, h.date_micros, i.username
            FROM hangouts h
            JOIN individuals i ON i.id = h.created_by
            WHERE h.public_id = ?
            "#,
        )
        .bind(public_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| unknown("fetch hangout", e))?;

        let Some((id, stored_public_id, location, description, duration, date, creator)) = row else {
            debug!(public_id = %public_id, "Hangout not found");
            return Err(StorageError::NotFound);
        };

        let participants = sqlx::query_scalar::<_, String>(
            r#"
            SELECT i.username
            FROM hangout_individuals hi
            JOIN individuals i ON i.id = hi.individual_id
            WHERE hi.hangout_id = ?
            ORDER BY hi.rowid
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| unknown("fetch hangout participants", e))?;

        let public_id = Uuid::parse_str(&stored_public_id)
            .map(HangoutId::from_uuid)
            .map_err(|e| unknown("parse stored hangout public id", e))?;
        let duration =
            Minutes::new(duration).map_err(|e| unknown("parse stored hangout duration", e))?;

        Ok(Hangout {
            public_id,
            details: HangoutDetails {
                location,
                description,
                duration,
                date: from_unix_micros(date, "hangouts.date_micros")?,
            },
            created_by: Username::from(creator),
            participants: participants.into_iter().map(Username::from).collect(),
        })
    }

    /// Number of participant links stored for a hangout; zero when it does not exist.
    pub async fn participant_count(&self, public_id: &HangoutId) -> StorageResult<usize> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM hangout_individuals hi
            JOIN hangouts h ON h.id = hi.hangout_id
            WHERE h.public_id = ?
            "#,
        )
        .bind(public_id.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| unknown("count hangout participants", e))?;

        usize::try_from(count).map_err(|e| unknown("count hangout participants", e))
    }
}

/// Run every statement of hangout creation on one transaction.
///
/// Returns the number of participant links inserted.
async fn insert_hangout(conn: &mut SqliteConnection, hangout: &Hangout) -> StorageResult<usize> {
    let now = chrono::Utc::now().timestamp();

    let creator_id = match lookup(conn, &hangout.created_by)
        .await
        .map_err(|e| unknown("look up hangout creator", e))?
    {
        None => {
            debug!(creator = %hangout.created_by, "Hangout creator not found");
            return Err(StorageError::CreatorNotFound);
        }
        Some(IndividualState { deleted: true, .. }) => {
            debug!(creator = %hangout.created_by, "Hangout creator is deleted");
            return Err(StorageError::CreatorDeleted);
        }
        Some(IndividualState { id, .. }) => id,
    };

    let hangout_id = insert_details(conn, hangout, creator_id, now).await?;
    debug!(hangout_id, public_id = %hangout.public_id, "Hangout row inserted");

    let mut linked: HashSet<&Username> = HashSet::with_capacity(hangout.participants.len());
    for participant in &hangout.participants {
        if !linked.insert(participant) {
            debug!(participant = %participant, "Skipping repeated participant");
            continue;
        }

        let participant_id = match lookup(conn, participant)
            .await
            .map_err(|e| unknown("look up hangout participant", e))?
        {
            None => {
                debug!(participant = %participant, "Hangout participant not found");
                return Err(StorageError::ParticipantNotFound(participant.clone()));
            }
            Some(IndividualState { deleted: true, .. }) => {
                debug!(participant = %participant, "Hangout participant is deleted");
                return Err(StorageError::ParticipantDeleted(participant.clone()));
            }
            Some(IndividualState { id, .. }) => id,
        };

        link_participant(conn, hangout_id, participant_id, participant, now).await?;
    }

    Ok(linked.len())
}

async fn insert_details(
    conn: &mut SqliteConnection,
    hangout: &Hangout,
    creator_id: i64,
    now: i64,
) -> StorageResult<i64> {
    let details = &hangout.details;
    let result = sqlx::query(
        r#"
        INSERT INTO hangouts (public_id, location, description, duration_minutes, date_micros, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(hangout.public_id.to_string())
    .bind(details.location.as_str())
    .bind(details.description.as_deref())
    .bind(details.duration.get())
    .bind(details.date.timestamp_micros())
    .bind(creator_id)
    .bind(now)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(result) => Ok(result.last_insert_rowid()),
        Err(err) => Err(match violation(&err) {
            // public_id is the only unique key on hangouts besides the rowid.
            Some(Violation {
                kind: ViolationKind::Unique,
                constraint: None | Some(Constraint::UniqueHangoutPublicId),
            }) => {
                debug!(public_id = %hangout.public_id, "Hangout public id already exists");
                StorageError::DuplicateHangoutId
            }
            // Unreachable while the creator check holds the write lock.
            Some(Violation {
                kind: ViolationKind::ForeignKey,
                constraint: None | Some(Constraint::FkHangoutCreator),
            }) => {
                warn!(
                    constraint = Constraint::FkHangoutCreator.name(),
                    creator = %hangout.created_by,
                    "Foreign key violation in hangouts table"
                );
                StorageError::CreatorNotFound
            }
            _ => unknown("insert hangout", err),
        }),
    }
}

async fn link_participant(
    conn: &mut SqliteConnection,
    hangout_id: i64,
    participant_id: i64,
    participant: &Username,
    now: i64,
) -> StorageResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO hangout_individuals (hangout_id, individual_id, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(hangout_id)
    .bind(participant_id)
    .bind(now)
    .execute(&mut *conn)
    .await;

    let result = match result {
        Ok(result) => result,
        Err(err) => {
            let Some(Violation {
                kind: ViolationKind::ForeignKey,
                constraint,
            }) = violation(&err)
            else {
                return Err(unknown("insert hangout participant", err));
            };

            let vanished = match constraint {
                Some(Constraint::FkHangout) => true,
                Some(Constraint::FkIndividual) => false,
                _ => !hangout_exists(conn, hangout_id).await?,
            };
            let constraint = if vanished {
                Constraint::FkHangout
            } else {
                Constraint::FkIndividual
            };
            warn!(
                constraint = constraint.name(),
                participant = %participant,
                "Foreign key violation in hangout_individuals table"
            );
            return Err(if vanished {
                StorageError::HangoutVanished
            } else {
                StorageError::ParticipantNotFound(participant.clone())
            });
        }
    };

    if result.rows_affected() != 1 {
        error!(
            rows_affected = result.rows_affected(),
            participant = %participant,
            "Expected exactly one participant row to be inserted"
        );
        return Err(StorageError::Unknown);
    }
    Ok(())
}

async fn hangout_exists(conn: &mut SqliteConnection, hangout_id: i64) -> StorageResult<bool> {
    let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM hangouts WHERE id = ?)")
        .bind(hangout_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| unknown("probe hangout after foreign key violation", e))?;
    Ok(exists != 0)
}
