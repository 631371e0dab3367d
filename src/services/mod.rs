//! Use cases built on the storage contract.
//!
//! Each use case validates its raw input completely before touching storage,
//! then passes storage failures through unchanged.

mod hangouts;
mod registration;

pub use hangouts::{ScheduleError, ScheduleRequest, schedule_hangout};
pub use registration::{RegistrationError, register_individual};
