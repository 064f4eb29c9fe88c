//! Core types for the vault-graph-sync framework.
//!
//! This crate provides the foundational types shared by every other crate in
//! the workspace:
//!
//! - [`PropertyMapping`] / [`MappingKind`] - how a front-matter property maps onto the graph
//! - [`LabelRule`] - tag and path rules that attach labels to nodes
//! - [`convert`] / [`PropertyValue`] - source value to typed node property conversion
//! - [`ErrorKind`] / [`classify`] - error taxonomy used in sync reports
//! - [`RelationshipType`] / [`LabelName`] - identifiers that get embedded into queries
//! - [`SyncQueueItem`], [`SyncProgress`], [`SyncReport`] - job and result records
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── graph-sink     (abstract graph writes, in-memory graph)
//!    ├─── neo4j-sink     (Cypher rendering + neo4rs driver)
//!    ├─── vault-source   (document store collaborators)
//!    ├─── job-history    (bounded history log)
//!    └─── sync-engine    (queue, infrastructure, writers, state hub)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{convert, PropertyValue, TargetType};
//!
//! let value = serde_json::json!("42");
//! assert_eq!(convert(&value, TargetType::Integer), Some(PropertyValue::Integer(42)));
//! assert_eq!(convert(&serde_json::json!("abc"), TargetType::Integer), None);
//! ```

pub mod errors;
pub mod identifiers;
pub mod job;
pub mod mapping;
pub mod progress;
pub mod results;
pub mod values;

// Re-exports for convenience
pub use errors::{classify, ErrorKind, SyncCoreError};
pub use identifiers::{LabelName, RelationshipType};
pub use job::{SyncKind, SyncQueueItem};
pub use mapping::{
    Direction, LabelRule, LabelRuleKind, MappingKind, MappingSet, NodePropertyMapping,
    PropertyMapping, RelationshipMapping, TargetType,
};
pub use progress::{MigrationState, SyncProgress, SyncStatus};
pub use results::{sample_errors, PropertyStats, RecordError, SyncReport, ERROR_SAMPLE_LIMIT};
pub use values::{convert, PropertyValue};
