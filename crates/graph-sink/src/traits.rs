//! Connector, session and transaction traits.
//!
//! The engine branches once on the configured backend (Neo4j or in-memory) and
//! works with trait objects afterwards, so one queue worker can drive either.

use crate::write::GraphWrite;
use anyhow::Result;
use std::collections::HashSet;
use std::fmt;

/// Credentials consumed by a connector. The password is never logged.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub database: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Opens sessions against a graph store.
#[async_trait::async_trait]
pub trait GraphConnector: Send + Sync {
    /// Open a session. Implementations may defer the network round-trip to
    /// [`GraphSession::ping`].
    async fn connect(&self, uri: &str, credentials: &Credentials) -> Result<Box<dyn GraphSession>>;
}

/// An open connection to the store.
#[async_trait::async_trait]
pub trait GraphSession: Send + Sync {
    /// Trivial round-trip query used to fail fast on bad credentials or an
    /// unreachable host.
    async fn ping(&self) -> Result<()>;

    /// Start a write transaction.
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>>;

    /// Release the session.
    async fn close(&self) -> Result<()>;
}

/// An open write transaction.
///
/// `commit` and `rollback` end the transaction; any call after that fails.
#[async_trait::async_trait]
pub trait GraphTransaction: Send {
    /// Apply one write.
    async fn write(&mut self, write: &GraphWrite) -> Result<()>;

    /// Whether a node with this identifier exists, as seen by this transaction.
    async fn node_exists(&mut self, id: &str) -> Result<bool>;

    /// Subset of `ids` that exist, as seen by this transaction.
    async fn existing_nodes(&mut self, ids: &[String]) -> Result<HashSet<String>>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}
