//! Location identifier value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Identifier of a candidate location (grid point)
///
/// Identifiers are non-empty and never contain `|`, which storage backends
/// use as a key separator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationId(String);

impl LocationId {
    /// Key separator reserved for composite storage keys
    pub const SEPARATOR: char = '|';

    /// Create a validated location id
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLocationId` if the trimmed id is empty or
    /// contains the reserved separator.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.contains(Self::SEPARATOR) {
            return Err(DomainError::InvalidLocationId(id));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LocationId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LocationId> for String {
    fn from(id: LocationId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_id_is_trimmed() {
        let id = LocationId::new("  grid-42 ").unwrap();
        assert_eq!(id.as_str(), "grid-42");
    }

    #[test]
    fn empty_and_separator_ids_are_rejected() {
        assert!(LocationId::new("").is_err());
        assert!(LocationId::new("   ").is_err());
        assert!(LocationId::new("a|b").is_err());
    }

    #[test]
    fn location_id_serializes_as_plain_string() {
        let id = LocationId::new("co-denver").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""co-denver""#);
        let back: LocationId = serde_json::from_str(r#""co-denver""#).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<LocationId>(r#""""#).is_err());
    }
}
