//! Neo4j graph sink for vault-graph-sync.
//!
//! Implements the `graph-sink` traits with the `neo4rs` driver. Every synced
//! node carries a base label (default `Note`) and is keyed by its `path`
//! property; see [`cypher`] for the exact statements issued.

mod client;
pub mod cypher;

pub use client::{Neo4jConnector, DEFAULT_BASE_LABEL};
pub use cypher::{escape_identifier, render_write, Statement};
