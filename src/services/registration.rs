//! Individual registration.

use crate::error::StorageError;
use crate::model::{Email, Individual, ModelError, Username};
use crate::storage::Storage;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Every validation failure found in the input, in field order.
    #[error("invalid registration: {0:?}")]
    Invalid(Vec<ModelError>),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Validate and store a new individual.
pub async fn register_individual(
    storage: &dyn Storage,
    name: &str,
    email: &str,
    username: &str,
) -> Result<Individual, RegistrationError> {
    let mut problems = Vec::new();

    if name.trim().is_empty() {
        problems.push(ModelError::EmptyName);
    }
    let username = Username::new(username.trim());
    if username.is_empty() {
        problems.push(ModelError::EmptyUsername);
    }
    let email = match Email::parse(email) {
        Ok(email) => Some(email),
        Err(e) => {
            problems.push(e);
            None
        }
    };

    let email = match email {
        Some(email) if problems.is_empty() => email,
        _ => {
            debug!(username = %username, problems = problems.len(), "Registration rejected");
            return Err(RegistrationError::Invalid(problems));
        }
    };

    let individual = Individual::new(username, email, name.trim());
    storage.store_individual(&individual).await?;

    info!(username = %individual.username, "Individual registered");
    Ok(individual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn registers_valid_input() {
        let db = Database::new(":memory:").await.unwrap();
        let individual = register_individual(&db, "Alice", "Alice <a@X.com>", "alice")
            .await
            .unwrap();

        assert_eq!(individual.email.as_str(), "a@x.com");
        assert_eq!(db.get_individual(&"alice".into()).await, Ok(individual));
    }

    #[tokio::test]
    async fn reports_every_problem_at_once() {
        let db = Database::new(":memory:").await.unwrap();
        let err = register_individual(&db, " ", "not-an-email", "")
            .await
            .unwrap_err();

        let RegistrationError::Invalid(problems) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert_eq!(problems.len(), 3);
        assert_eq!(problems[0], ModelError::EmptyName);
        assert_eq!(problems[1], ModelError::EmptyUsername);
        assert!(matches!(problems[2], ModelError::InvalidEmail(_)));
        assert_eq!(db.get_individual(&"".into()).await, Err(StorageError::NotFound));
    }

    #[tokio::test]
    async fn passes_storage_conflicts_through() {
        let db = Database::new(":memory:").await.unwrap();
        register_individual(&db, "Alice", "a@x.com", "alice")
            .await
            .unwrap();

        assert_eq!(
            register_individual(&db, "Other", "o@x.com", "alice").await,
            Err(RegistrationError::Storage(StorageError::DuplicateUsername))
        );
        assert_eq!(
            register_individual(&db, "Other", "a@x.com", "other").await,
            Err(RegistrationError::Storage(StorageError::DuplicateEmail))
        );
    }
}
