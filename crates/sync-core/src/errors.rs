//! Error taxonomy for sync reports.
//!
//! Errors raised by the graph driver are opaque strings, so they are bucketed
//! into an [`ErrorKind`] by matching substrings of the rendered message. The
//! match is driven by [`CLASSIFICATION_TABLE`], an ordered list of
//! `(patterns, kind)` rows. The first row with a matching pattern wins, so new
//! rows must be appended below existing ones unless they are meant to take
//! priority.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a per-record sync failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Connectivity problems between the engine and the graph store.
    Network,
    /// Transaction could not be opened, committed or rolled back.
    Transaction,
    /// A relationship or label was requested for a node that was never synced.
    SourceNodeMissing,
    /// Placeholder target node could not be written.
    TargetNodeFailure,
    /// Identifier rejected before it reached the store.
    Validation,
    /// Value had the wrong type for the requested operation.
    InvalidType,
    /// The store rejected the statement itself.
    QueryExecution,
    /// Nothing in the table matched.
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK",
            ErrorKind::Transaction => "TRANSACTION",
            ErrorKind::SourceNodeMissing => "SOURCE_NODE_MISSING",
            ErrorKind::TargetNodeFailure => "TARGET_NODE_FAILURE",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::InvalidType => "INVALID_TYPE",
            ErrorKind::QueryExecution => "QUERY_EXECUTION",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered classification rules. Patterns are lowercase and matched against
/// the lowercased message.
pub const CLASSIFICATION_TABLE: &[(&[&str], ErrorKind)] = &[
    (
        &[
            "serviceunavailable",
            "service unavailable",
            "connection refused",
            "econnrefused",
            "connection reset",
            "connection closed",
            "broken pipe",
            "unreachable",
            "network",
            "socket",
            "timed out",
            "timeout",
            "authentication",
            "unauthorized",
        ],
        ErrorKind::Network,
    ),
    (
        &[
            "transaction",
            "deadlock",
            "commit",
            "rollback",
            "rolled back",
        ],
        ErrorKind::Transaction,
    ),
    (&["source node"], ErrorKind::SourceNodeMissing),
    (&["target node", "placeholder"], ErrorKind::TargetNodeFailure),
    (
        &[
            "invalid relationship type",
            "invalid label",
            "validation",
        ],
        ErrorKind::Validation,
    ),
    (
        &[
            "type mismatch",
            "invalid type",
            "cannot convert",
            "typeerror",
            "property values can only be of primitive types",
        ],
        ErrorKind::InvalidType,
    ),
    (
        &[
            "syntax error",
            "syntaxerror",
            "neo.clienterror.statement",
            "statement",
            "cypher",
            "query",
        ],
        ErrorKind::QueryExecution,
    ),
];

/// Classify an error message. Never panics; unmatched messages are
/// [`ErrorKind::Unknown`].
pub fn classify(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    CLASSIFICATION_TABLE
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| lowered.contains(p)))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Errors raised while building core values from user configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncCoreError {
    #[error("Invalid relationship type '{value}': {reason}")]
    InvalidRelationshipType { value: String, reason: String },

    #[error("Invalid label '{value}': {reason}")]
    InvalidLabel { value: String, reason: String },

    #[error("Invalid batch size '{0}': expected \"auto\" or a positive integer")]
    InvalidBatchSize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_network() {
        assert_eq!(
            classify("ServiceUnavailable: Connection refused (os error 111)"),
            ErrorKind::Network
        );
        assert_eq!(classify("request timed out"), ErrorKind::Network);
    }

    #[test]
    fn test_network_takes_priority_over_transaction() {
        assert_eq!(
            classify("Failed to commit transaction: connection reset by peer"),
            ErrorKind::Network
        );
        assert_eq!(
            classify("Failed to commit transaction"),
            ErrorKind::Transaction
        );
    }

    #[test]
    fn test_classify_domain_kinds() {
        assert_eq!(
            classify("Source node not found: notes/a.md"),
            ErrorKind::SourceNodeMissing
        );
        assert_eq!(
            classify("Failed to upsert target node b.md"),
            ErrorKind::TargetNodeFailure
        );
        assert_eq!(
            classify("Invalid relationship type 'has_link'"),
            ErrorKind::Validation
        );
        assert_eq!(
            classify("Type mismatch: expected Integer"),
            ErrorKind::InvalidType
        );
        assert_eq!(
            classify("Neo.ClientError.Statement.SyntaxError: Invalid input"),
            ErrorKind::QueryExecution
        );
    }

    #[test]
    fn test_classify_unknown_default() {
        assert_eq!(classify(""), ErrorKind::Unknown);
        assert_eq!(classify("something odd happened"), ErrorKind::Unknown);
    }

    #[test]
    fn test_error_kind_serializes_screaming() {
        let json = serde_json::to_string(&ErrorKind::SourceNodeMissing).unwrap();
        assert_eq!(json, "\"SOURCE_NODE_MISSING\"");
        assert_eq!(ErrorKind::QueryExecution.to_string(), "QUERY_EXECUTION");
    }
}
