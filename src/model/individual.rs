//! Individual domain model.

use super::ModelError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Public, unique and immutable key of an individual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A parsed and normalized email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

/// `Display Name <local@domain>`
fn display_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^<>]*<([^<>]+)>$").expect("display-name email pattern is valid")
    })
}

/// Dot-atom local part, hostname-label domain.
fn address_grammar() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
            r"@",
            r"[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
        ))
        .expect("address pattern is valid")
    })
}

impl Email {
    /// Parse free text into an email address.
    ///
    /// Accepts either a bare address or the `Name <address>` form. The domain
    /// is lowercased; the local part is kept as written.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let trimmed = text.trim();
        let address = match display_form().captures(trimmed) {
            Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim(),
            None => trimmed,
        };

        if address.len() > 254 || !address_grammar().is_match(address) {
            return Err(ModelError::InvalidEmail(text.to_string()));
        }

        let (local, domain) = address
            .rsplit_once('@')
            .ok_or_else(|| ModelError::InvalidEmail(text.to_string()))?;
        if local.len() > 64 {
            return Err(ModelError::InvalidEmail(text.to_string()));
        }

        Ok(Self(format!("{}@{}", local, domain.to_ascii_lowercase())))
    }

    /// Wrap a value read back from storage, which was validated on the way in.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// A registered person, as stored and returned by the storage contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub username: Username,
    pub email: Email,
    pub name: String,
}

impl Individual {
    pub fn new(username: impl Into<Username>, email: Email, name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email,
            name: name.into(),
        }
    }
}

/// Soft-delete lifecycle. `Deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl Lifecycle {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }
}

/// Full stored row of an individual, including soft-deleted ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualRecord {
    /// Store-assigned internal id; never reused.
    pub id: i64,
    pub individual: Individual,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_address() {
        let email = Email::parse("test@example.com").unwrap();
        assert_eq!(email.as_str(), "test@example.com");
    }

    #[test]
    fn parses_display_name_form() {
        let email = Email::parse("Alice Liddell <alice@Example.COM>").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn keeps_local_part_case_and_trims() {
        let email = Email::parse("  Bob.Smith+tag@x.com ").unwrap();
        assert_eq!(email.as_str(), "Bob.Smith+tag@x.com");
    }

    #[test]
    fn accepts_single_label_domain() {
        assert!(Email::parse("root@localhost").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for input in [
            "",
            "test@",
            "@example.com",
            "testexample.com",
            "a..b@example.com",
            ".a@example.com",
            "a@-example.com",
            "a b@example.com",
            "a@b@example.com",
        ] {
            assert_eq!(
                Email::parse(input),
                Err(ModelError::InvalidEmail(input.to_string())),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong_local_part() {
        let input = format!("{}@example.com", "a".repeat(65));
        assert!(Email::parse(&input).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<Email, _> = serde_json::from_str("\"a@x.com\"");
        assert!(ok.is_ok());
        let bad: Result<Email, _> = serde_json::from_str("\"not-an-email\"");
        assert!(bad.is_err());
    }

    #[test]
    fn blank_username_is_empty() {
        assert!(Username::new("  ").is_empty());
        assert!(!Username::new("alice").is_empty());
    }
}
