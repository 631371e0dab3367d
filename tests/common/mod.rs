//! Integration test common infrastructure.
//!
//! Opens throwaway databases and builds fixture individuals and hangouts.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use hangcounts::Database;
use hangcounts::config::DatabaseConfig;
use hangcounts::model::{Email, Hangout, HangoutDetails, HangoutId, Individual, Minutes, Username};
use tempfile::TempDir;

/// A file-backed database that lives as long as its temporary directory.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

impl TestDb {
    /// File database with a real pool, for tests with concurrent writers.
    pub async fn file(max_connections: u32) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            path: dir.path().join("hangcounts.db").to_string_lossy().into_owned(),
            max_connections,
            busy_timeout_secs: 30,
            acquire_timeout_secs: 30,
            ..DatabaseConfig::default()
        };
        let db = Database::connect(&config)
            .await
            .expect("Failed to open file database");
        Self { db, _dir: dir }
    }
}

pub async fn memory_db() -> Database {
    Database::new(":memory:")
        .await
        .expect("Failed to open in-memory database")
}

pub fn individual(username: &str) -> Individual {
    let email = Email::parse(&format!("{username}@example.com")).expect("fixture email is valid");
    Individual::new(username, email, username.to_uppercase())
}

pub fn hangout(creator: &str, participants: &[&str]) -> Hangout {
    hangout_with_id(HangoutId::generate(), creator, participants)
}

pub fn hangout_with_id(public_id: HangoutId, creator: &str, participants: &[&str]) -> Hangout {
    let date = Utc
        .with_ymd_and_hms(2026, 7, 4, 18, 30, 0)
        .single()
        .expect("fixture date is valid");
    Hangout {
        public_id,
        details: HangoutDetails::new(
            "Dolores Park",
            Some("Picnic".to_string()),
            Minutes::new(120).expect("fixture duration is valid"),
            date,
        )
        .expect("fixture details are valid"),
        created_by: Username::from(creator),
        participants: participants.iter().copied().map(Username::from).collect(),
    }
}
