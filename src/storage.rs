//! Storage contract.
//!
//! The capability interface the rest of the system depends on, independent of
//! the backing technology. [`crate::db::Database`] is the relational
//! implementation.

use crate::error::StorageResult;
use crate::model::{Hangout, HangoutId, Individual, Username};
use async_trait::async_trait;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a new active individual.
    ///
    /// Fails with `DuplicateUsername` or `DuplicateEmail`, checked against
    /// every stored individual including soft-deleted ones.
    async fn store_individual(&self, individual: &Individual) -> StorageResult<()>;

    /// Fetch an active individual by username.
    ///
    /// A soft-deleted individual yields `AlreadyDeleted`, never the record.
    async fn get_individual(&self, username: &Username) -> StorageResult<Individual>;

    /// Soft-delete an individual.
    ///
    /// Fails with `NotFound` for unknown usernames and `AlreadyDeleted` when
    /// the individual was deleted before.
    async fn mark_individual_deleted(&self, username: &Username) -> StorageResult<()>;

    /// Create a hangout together with all of its participant links, atomically.
    async fn store_hangout(&self, hangout: &Hangout) -> StorageResult<()>;

    /// Fetch a hangout and its participants by public id.
    async fn get_hangout(&self, public_id: &HangoutId) -> StorageResult<Hangout>;
}
