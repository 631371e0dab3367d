//! Hangout scheduling.

use crate::error::StorageError;
use crate::model::{Hangout, HangoutDetails, HangoutId, Minutes, ModelError, Username};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

/// Raw input for scheduling a hangout.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub creator: Username,
    pub location: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub date: DateTime<Utc>,
    pub participants: Vec<Username>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid hangout: {0:?}")]
    Invalid(Vec<ModelError>),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Validate a request, then create the hangout with the creator among its participants.
pub async fn schedule_hangout(
    storage: &dyn Storage,
    request: ScheduleRequest,
) -> Result<HangoutId, ScheduleError> {
    let ScheduleRequest {
        creator,
        location,
        description,
        duration_minutes,
        date,
        mut participants,
    } = request;

    let mut problems = Vec::new();
    if creator.is_empty() {
        problems.push(ModelError::EmptyUsername);
    }
    if location.trim().is_empty() {
        problems.push(ModelError::EmptyLocation);
    }
    let duration = match Minutes::new(duration_minutes) {
        Ok(duration) => Some(duration),
        Err(e) => {
            problems.push(e);
            None
        }
    };

    let details = match duration {
        Some(duration) if problems.is_empty() => {
            HangoutDetails::new(location, description, duration, date)
                .map_err(|e| ScheduleError::Invalid(vec![e]))?
        }
        _ => {
            debug!(creator = %creator, problems = problems.len(), "Hangout request rejected");
            return Err(ScheduleError::Invalid(problems));
        }
    };

    if !participants.contains(&creator) {
        participants.insert(0, creator.clone());
    }

    let hangout = Hangout {
        public_id: HangoutId::generate(),
        details,
        created_by: creator,
        participants,
    };
    storage.store_hangout(&hangout).await?;

    info!(public_id = %hangout.public_id, creator = %hangout.created_by, "Hangout scheduled");
    Ok(hangout.public_id)
}
