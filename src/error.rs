//! Storage error taxonomy for hangcounts.
//!
//! This is the closed set of failures the storage contract may return. Raw
//! database failures never cross this boundary: the persistence engine
//! classifies what it can and reports everything else as [`StorageError::Unknown`]
//! after logging the underlying cause.

use crate::model::Username;
use thiserror::Error;

/// Errors returned by every [`Storage`](crate::storage::Storage) operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,

    #[error("record is soft-deleted")]
    AlreadyDeleted,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("a hangout with this public id already exists")]
    DuplicateHangoutId,

    #[error("hangout creator not found")]
    CreatorNotFound,

    #[error("hangout creator is deleted")]
    CreatorDeleted,

    #[error("hangout participant not found: {0}")]
    ParticipantNotFound(Username),

    #[error("hangout participant is deleted: {0}")]
    ParticipantDeleted(Username),

    /// The hangout row disappeared while its participants were being linked.
    #[error("hangout not found when inserting a participant")]
    HangoutVanished,

    #[error("unknown storage error")]
    Unknown,
}

impl StorageError {
    /// Get a static error code string for logs and API payloads.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyDeleted => "already_deleted",
            Self::DuplicateUsername => "duplicate_username",
            Self::DuplicateEmail => "duplicate_email",
            Self::DuplicateHangoutId => "duplicate_hangout_id",
            Self::CreatorNotFound => "creator_not_found",
            Self::CreatorDeleted => "creator_deleted",
            Self::ParticipantNotFound(_) => "participant_not_found",
            Self::ParticipantDeleted(_) => "participant_deleted",
            Self::HangoutVanished => "hangout_vanished",
            Self::Unknown => "unknown",
        }
    }

    /// Message suitable for showing to the person who triggered the operation.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound => "No such account exists.".to_string(),
            Self::AlreadyDeleted => "This account has been removed.".to_string(),
            Self::DuplicateUsername => "That username is already taken.".to_string(),
            Self::DuplicateEmail => "That email address is already registered.".to_string(),
            Self::DuplicateHangoutId => "This hangout has already been created.".to_string(),
            Self::CreatorNotFound => "The account creating this hangout does not exist.".to_string(),
            Self::CreatorDeleted => "The account creating this hangout has been removed.".to_string(),
            Self::ParticipantNotFound(username) => {
                format!("Participant {username} does not exist.")
            }
            Self::ParticipantDeleted(username) => {
                format!("Participant {username} has removed their account.")
            }
            Self::HangoutVanished | Self::Unknown => {
                "Something went wrong. Please try again later.".to_string()
            }
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unknown | Self::HangoutVanished)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
