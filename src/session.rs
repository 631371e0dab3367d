//! Session lifecycle.
//!
//! Computes session expiry and confirms a session's subject is still an
//! active individual. Session persistence and cookies belong to the HTTP layer.

use crate::config::SessionConfig;
use crate::error::StorageError;
use crate::model::Username;
use crate::storage::Storage;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Default name of the cookie carrying the session id.
pub const SESSION_COOKIE_NAME: &str = "session_id";

/// Random bytes per session id.
const SESSION_ID_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session expired")]
    Expired,
    #[error("session subject not found")]
    SubjectNotFound,
    #[error("session subject is deleted")]
    SubjectDeleted,
    #[error(transparent)]
    Storage(StorageError),
}

/// Generate an unguessable session id: 32 random bytes, base64url without padding.
pub fn generate_session_id() -> String {
    let mut id = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut id);
    URL_SAFE_NO_PAD.encode(id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub subject: Username,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    pub fn new(subject: Username, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_session_id(),
            subject,
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Record activity at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }
}

pub struct SessionManager {
    storage: Arc<dyn Storage>,
    idle_expiration: Duration,
    absolute_expiration: Duration,
    cookie_name: String,
}

impl SessionManager {
    pub fn new(
        storage: Arc<dyn Storage>,
        idle_expiration: Duration,
        absolute_expiration: Duration,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            idle_expiration,
            absolute_expiration,
            cookie_name: cookie_name.into(),
        }
    }

    /// Build a manager from the `[session]` configuration section.
    pub fn from_config(storage: Arc<dyn Storage>, config: &SessionConfig) -> Self {
        Self::new(
            storage,
            seconds(config.idle_timeout_secs),
            seconds(config.absolute_timeout_secs),
            config.cookie_name.clone(),
        )
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// A session expires once it outlives the absolute limit or sits idle past the idle limit.
    pub fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.created_at > self.absolute_expiration
            || now - session.last_activity_at > self.idle_expiration
    }

    /// Confirm the session is live and its subject still an active individual.
    pub async fn authenticate(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Username, SessionError> {
        if self.is_expired(session, now) {
            debug!(subject = %session.subject, "Session expired");
            return Err(SessionError::Expired);
        }

        match self.storage.get_individual(&session.subject).await {
            Ok(individual) => Ok(individual.username),
            Err(StorageError::NotFound) => Err(SessionError::SubjectNotFound),
            Err(StorageError::AlreadyDeleted) => Err(SessionError::SubjectDeleted),
            Err(other) => Err(SessionError::Storage(other)),
        }
    }
}

fn seconds(secs: u64) -> Duration {
    Duration::from_std(std::time::Duration::from_secs(secs)).unwrap_or(Duration::MAX)
}
