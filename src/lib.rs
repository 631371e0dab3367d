//! hangcounts - storage and consistency layer for individuals and hangouts.
//!
//! Individuals register with a unique username and email and are soft-deleted
//! rather than removed. Hangouts are created together with their full
//! participant set in a single transaction, and only ever reference active
//! individuals.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod services;
pub mod session;
pub mod storage;

pub use db::{Database, DbError};
pub use error::{StorageError, StorageResult};
pub use storage::Storage;
