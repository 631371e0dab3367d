//! End-to-end use cases: registration, scheduling and session checks.

mod common;

use chrono::{Duration, Utc};
use common::memory_db;
use hangcounts::model::Username;
use hangcounts::services::{
    RegistrationError, ScheduleError, ScheduleRequest, register_individual, schedule_hangout,
};
use hangcounts::session::{Session, SessionError, SessionManager};
use hangcounts::{Storage, StorageError};
use std::sync::Arc;

#[tokio::test]
async fn test_register_schedule_and_authenticate() {
    let db = memory_db().await;
    register_individual(&db, "Alice", "Alice <alice@example.com>", "alice")
        .await
        .expect("register alice");
    register_individual(&db, "Bob", "bob@example.com", "bob")
        .await
        .expect("register bob");

    let id = schedule_hangout(
        &db,
        ScheduleRequest {
            creator: "alice".into(),
            location: "Library".to_string(),
            description: None,
            duration_minutes: 45,
            date: Utc::now(),
            participants: vec!["bob".into()],
        },
    )
    .await
    .expect("schedule hangout");
    assert_eq!(db.participant_count(&id).await, Ok(2));

    let sessions = SessionManager::new(
        Arc::new(db.clone()),
        Duration::minutes(30),
        Duration::hours(24),
        "session_id",
    );
    let now = Utc::now();
    let session = Session::new("bob".into(), now);
    assert_eq!(
        sessions.authenticate(&session, now).await,
        Ok(Username::from("bob"))
    );

    db.mark_individual_deleted(&Username::from("bob"))
        .await
        .expect("delete bob");
    assert_eq!(
        sessions.authenticate(&session, now).await,
        Err(SessionError::SubjectDeleted)
    );

    let stranger = Session::new("mallory".into(), now);
    assert_eq!(
        sessions.authenticate(&stranger, now).await,
        Err(SessionError::SubjectNotFound)
    );
}

#[tokio::test]
async fn test_deleted_creator_cannot_schedule() {
    let db = memory_db().await;
    register_individual(&db, "Alice", "alice@example.com", "alice")
        .await
        .expect("register alice");
    db.mark_individual_deleted(&Username::from("alice"))
        .await
        .expect("delete alice");

    let result = schedule_hangout(
        &db,
        ScheduleRequest {
            creator: "alice".into(),
            location: "Library".to_string(),
            description: None,
            duration_minutes: 45,
            date: Utc::now(),
            participants: Vec::new(),
        },
    )
    .await;
    assert_eq!(result, Err(ScheduleError::Storage(StorageError::CreatorDeleted)));
}

#[tokio::test]
async fn test_registration_messages_are_field_specific() {
    let db = memory_db().await;
    register_individual(&db, "Alice", "alice@example.com", "alice")
        .await
        .expect("register alice");

    let Err(RegistrationError::Storage(e)) =
        register_individual(&db, "Alice", "alice@example.com", "alice2").await
    else {
        panic!("expected a storage conflict");
    };
    assert_eq!(e.error_code(), "duplicate_email");
    assert!(e.user_message().contains("email"));
    assert!(!e.is_retryable());
}
