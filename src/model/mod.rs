//! Domain model for hangcounts.
//!
//! Immutable value types for individuals and the hangouts they take part in.
//! The only behavior here is construction-time validation:
//! - [`Email::parse`] rejects addresses outside the standard grammar
//! - [`Minutes::new`] rejects negative durations
//! - [`HangoutDetails::new`] rejects an empty location

mod hangout;
mod individual;

pub use hangout::{Hangout, HangoutDetails, HangoutId, Minutes};
pub use individual::{Email, Individual, IndividualRecord, Lifecycle, Username};

use thiserror::Error;

/// Validation failures raised while constructing domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("duration cannot be negative, got {0} minutes")]
    NegativeDuration(i64),

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("name cannot be empty")]
    EmptyName,

    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("location cannot be empty")]
    EmptyLocation,
}
