//! Graph store trait abstraction.
//!
//! This crate defines the connector/session/transaction traits the sync engine
//! writes through, and the store-agnostic [`GraphWrite`] operations it issues.
//! `neo4j-sink` implements the traits on top of the Neo4j driver; the
//! [`MemoryGraph`] implementation in this crate backs tests and dry runs.
//!
//! Writes are idempotent: nodes are upserted by identifier (the record's
//! vault-relative path), relationships are merged, and labels are set.

mod memory;
mod traits;
mod write;

pub use memory::{GraphState, MemoryConnector, MemoryGraph, MemoryNode, MemoryRelationship};
pub use traits::{Credentials, GraphConnector, GraphSession, GraphTransaction};
pub use write::GraphWrite;
