//! Constraint-violation classification.
//!
//! Violations are recognised through sqlx's structured [`ErrorKind`], never by
//! inspecting error text. When the backend names the violated constraint it is
//! mapped onto [`Constraint`]; SQLite does not, so callers resolve the
//! remaining ambiguity with a probe query inside the same transaction.

use sqlx::error::ErrorKind;

/// Named constraints declared by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    UniqueIndividualUsername,
    UniqueIndividualEmail,
    UniqueHangoutPublicId,
    FkHangoutCreator,
    PkHangoutIndividual,
    FkHangout,
    FkIndividual,
}

impl Constraint {
    const ALL: [Constraint; 7] = [
        Self::UniqueIndividualUsername,
        Self::UniqueIndividualEmail,
        Self::UniqueHangoutPublicId,
        Self::FkHangoutCreator,
        Self::PkHangoutIndividual,
        Self::FkHangout,
        Self::FkIndividual,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::UniqueIndividualUsername => "unique_individual_username",
            Self::UniqueIndividualEmail => "unique_individual_email",
            Self::UniqueHangoutPublicId => "unique_hangout_public_id",
            Self::FkHangoutCreator => "fk_hangout_creator",
            Self::PkHangoutIndividual => "pk_hangout_individual",
            Self::FkHangout => "fk_hangout",
            Self::FkIndividual => "fk_individual",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViolationKind {
    Unique,
    ForeignKey,
}

/// A classified constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Violation {
    pub kind: ViolationKind,
    /// `None` when the backend does not report which constraint fired.
    pub constraint: Option<Constraint>,
}

/// Classify a sqlx error as a unique or foreign-key violation.
///
/// Returns `None` for every other failure, including other constraint kinds.
pub(crate) fn violation(err: &sqlx::Error) -> Option<Violation> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };

    let kind = match db_err.kind() {
        ErrorKind::UniqueViolation => ViolationKind::Unique,
        ErrorKind::ForeignKeyViolation => ViolationKind::ForeignKey,
        _ => return None,
    };

    Some(Violation {
        kind,
        constraint: db_err.constraint().and_then(Constraint::from_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[test]
    fn names_round_trip() {
        for constraint in Constraint::ALL {
            assert_eq!(Constraint::from_name(constraint.name()), Some(constraint));
        }
        assert_eq!(Constraint::from_name("no_such_constraint"), None);
    }

    #[test]
    fn non_database_errors_are_not_violations() {
        assert_eq!(violation(&sqlx::Error::RowNotFound), None);
    }

    #[tokio::test]
    async fn classifies_sqlite_violations_by_kind() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE parent (id INTEGER PRIMARY KEY, tag TEXT NOT NULL UNIQUE)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE child (
                parent_id INTEGER NOT NULL REFERENCES parent (id),
                note TEXT CHECK (note <> '')
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO parent (id, tag) VALUES (1, 'a')")
            .execute(&pool)
            .await
            .unwrap();

        let unique = sqlx::query("INSERT INTO parent (id, tag) VALUES (2, 'a')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert_eq!(
            violation(&unique),
            Some(Violation {
                kind: ViolationKind::Unique,
                constraint: None,
            })
        );

        let foreign = sqlx::query("INSERT INTO child (parent_id) VALUES (99)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert_eq!(
            violation(&foreign).map(|v| v.kind),
            Some(ViolationKind::ForeignKey)
        );

        let check = sqlx::query("INSERT INTO child (parent_id, note) VALUES (1, '')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert_eq!(violation(&check), None);
    }
}
