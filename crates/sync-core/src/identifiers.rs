//! Identifiers that are embedded into graph queries as literal syntax.
//!
//! Relationship types and labels cannot be passed as bound parameters, so
//! both are checked (relationship types) or escaped (labels) before a writer
//! is allowed to use them.

use crate::errors::SyncCoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A relationship type that passed the strict grammar check:
/// starts with `A-Z`, contains only `A-Z`, `0-9` and `_`, and has no
/// leading, trailing or doubled underscore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelationshipType(String);

impl RelationshipType {
    pub fn parse(value: &str) -> Result<Self, SyncCoreError> {
        let invalid = |reason: &str| SyncCoreError::InvalidRelationshipType {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let first = value.chars().next().ok_or_else(|| invalid("empty"))?;
        if !first.is_ascii_uppercase() {
            return Err(invalid("must start with an uppercase letter"));
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_'))
        {
            return Err(invalid(&format!("unexpected character '{c}'")));
        }
        if value.ends_with('_') {
            return Err(invalid("trailing underscore"));
        }
        if value.contains("__") {
            return Err(invalid("double underscore"));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RelationshipType {
    type Error = SyncCoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RelationshipType> for String {
    fn from(value: RelationshipType) -> Self {
        value.0
    }
}

/// A node label reduced to a safe identifier form.
///
/// Characters outside letters, digits and `_` become `_`, and a label that
/// would start with a digit gets a leading `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelName(String);

impl LabelName {
    pub fn sanitize(raw: &str) -> Result<Self, SyncCoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SyncCoreError::InvalidLabel {
                value: raw.to_string(),
                reason: "empty".to_string(),
            });
        }

        let mut label: String = trimmed
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if label.starts_with(|c: char| c.is_ascii_digit()) {
            label.insert(0, '_');
        }

        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_type_accepts_valid() {
        assert!(RelationshipType::parse("HAS_LINK").is_ok());
        assert!(RelationshipType::parse("RELATED_TO").is_ok());
        assert!(RelationshipType::parse("CITES2").is_ok());
        assert!(RelationshipType::parse("A").is_ok());
    }

    #[test]
    fn test_relationship_type_rejects_invalid() {
        for bad in ["", "has_link", "HAS__LINK", "_LINK", "LINK_", "HAS-LINK", "2LINK", "HAS LINK"] {
            assert!(
                RelationshipType::parse(bad).is_err(),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn test_relationship_type_error_message() {
        let err = RelationshipType::parse("has_link").unwrap_err();
        assert!(err.to_string().contains("Invalid relationship type 'has_link'"));
    }

    #[test]
    fn test_relationship_type_deserialize_validates() {
        let ok: Result<RelationshipType, _> = serde_json::from_str("\"CITES\"");
        assert!(ok.is_ok());
        let bad: Result<RelationshipType, _> = serde_json::from_str("\"cites\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_label_sanitize() {
        assert_eq!(LabelName::sanitize("Project").unwrap().as_str(), "Project");
        assert_eq!(LabelName::sanitize("my label").unwrap().as_str(), "my_label");
        assert_eq!(LabelName::sanitize("a`b").unwrap().as_str(), "a_b");
        assert_eq!(LabelName::sanitize("2024").unwrap().as_str(), "_2024");
        assert_eq!(LabelName::sanitize("  Area ").unwrap().as_str(), "Area");
        assert!(LabelName::sanitize("   ").is_err());
    }
}
