//! Hangout domain model.

use super::{ModelError, Username};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Externally visible hangout identifier, distinct from the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HangoutId(Uuid);

impl HangoutId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for HangoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Non-negative duration in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Minutes(i64);

impl Minutes {
    pub fn new(minutes: i64) -> Result<Self, ModelError> {
        if minutes < 0 {
            return Err(ModelError::NegativeDuration(minutes));
        }
        Ok(Self(minutes))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Minutes {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Minutes> for i64 {
    fn from(value: Minutes) -> Self {
        value.0
    }
}

/// Descriptive part of a hangout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangoutDetails {
    pub location: String,
    pub description: Option<String>,
    pub duration: Minutes,
    pub date: DateTime<Utc>,
}

impl HangoutDetails {
    /// Build validated details. The date is truncated to whole microseconds,
    /// the resolution hangout dates are stored at.
    pub fn new(
        location: impl Into<String>,
        description: Option<String>,
        duration: Minutes,
        date: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let location = location.into();
        if location.trim().is_empty() {
            return Err(ModelError::EmptyLocation);
        }
        Ok(Self {
            location,
            description,
            duration,
            date: date.trunc_subsecs(6),
        })
    }
}

/// A group event linking a creator and a set of participants.
///
/// The creator is not implicitly a participant: the stored participant set is
/// exactly `participants`. Hangouts reference individuals by username so they
/// outlive any single participant's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hangout {
    pub public_id: HangoutId,
    pub details: HangoutDetails,
    pub created_by: Username,
    pub participants: Vec<Username>,
}
