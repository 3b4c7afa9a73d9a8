//! Actor identity shared by the credential store and the movement ledger.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Login name of a user.
///
/// Matching is exact and case-sensitive: `"alice"` and `"Alice"` are different users.
/// The value is stored as given; only blank names are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Username {}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_case_sensitive() {
        let lower = Username::new("alice").unwrap();
        let upper = Username::new("Alice").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn blank_username_is_rejected() {
        assert!(matches!(Username::new("   "), Err(DomainError::Validation(_))));
        assert!(Username::new("").is_err());
    }

    #[test]
    fn deserialization_applies_validation() {
        let ok: Username = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(ok.as_str(), "bob");
        assert!(serde_json::from_str::<Username>("\"\"").is_err());
    }
}
