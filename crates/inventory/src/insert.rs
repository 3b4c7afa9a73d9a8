//! Identifiers and quantities of tooling inserts.

use serde::{Deserialize, Serialize};

use toolcrib_core::{DomainError, DomainResult, ValueObject, text_value_object};

text_value_object!(
    /// Alphanumeric "Insert Number" identifying a physical tooling insert.
    ///
    /// Case is preserved; surrounding whitespace is trimmed.
    pub struct InsertNumber,
    "insert number"
);

text_value_object!(
    /// Tool an insert was mounted on when it was consumed.
    pub struct ToolNumber,
    "tool number"
);

/// Strictly positive movement quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive (got {value})"
            )));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::validation(format!("quantity {value} is too large")))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Signed value for aggregate arithmetic.
    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }
}

impl ValueObject for Quantity {}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.as_i64()
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_number_is_trimmed_and_case_preserved() {
        let n = InsertNumber::new("  cnmg120408 ").unwrap();
        assert_eq!(n.as_str(), "cnmg120408");
        assert_ne!(n, InsertNumber::new("CNMG120408").unwrap());
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(matches!(InsertNumber::new(""), Err(DomainError::Validation(_))));
        assert!(matches!(ToolNumber::new("\t"), Err(DomainError::Validation(_))));
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(-4).is_err());
        assert!(Quantity::new(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(Quantity::new(12).unwrap().as_i64(), 12);
    }

    #[test]
    fn deserialization_rejects_invalid_values() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<InsertNumber>("\"  \"").is_err());
        let q: Quantity = serde_json::from_str("5").unwrap();
        assert_eq!(q.get(), 5);
    }
}
