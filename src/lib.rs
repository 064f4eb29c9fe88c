//! vault-graph-sync library
//!
//! Syncs a markdown vault into a Neo4j graph: front matter properties become
//! node properties, link properties become relationships, and tag or folder
//! rules become labels.
//!
//! # Crates
//!
//! - `sync_core` - mappings, label rules, value conversion, error taxonomy
//! - `vault_source` - markdown vault scanning, front matter, tags and links
//! - `graph_sink` / `neo4j_sink` - graph writes against memory or Neo4j
//! - `job_history` - bounded history of finished jobs
//! - `sync_engine` - queue manager, transaction infrastructure, writers
//!
//! # CLI Usage
//!
//! ```bash
//! # Sync everything configured in vault-graph-sync.toml
//! NEO4J_PASSWORD=secret vault-graph-sync sync
//!
//! # Re-sync two relationship properties
//! vault-graph-sync sync-relationships related parent
//!
//! # Try the label rules without touching Neo4j
//! vault-graph-sync --dry-run sync-labels
//! ```

use clap::Parser;
use graph_sink::Credentials;

pub mod app;
pub mod config;

pub use app::App;
pub use config::{ConnectionSettings, Settings, DEFAULT_SETTINGS_FILE};

#[derive(Parser, Clone)]
pub struct GraphOpts {
    /// Neo4j connection URI (overrides the settings file)
    #[arg(long, env = "NEO4J_URI")]
    pub neo4j_uri: Option<String>,

    /// Neo4j password
    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub neo4j_password: Option<String>,

    /// Dry run mode - sync into an in-memory graph instead of Neo4j
    #[arg(long)]
    pub dry_run: bool,
}

impl std::fmt::Debug for GraphOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphOpts")
            .field("neo4j_uri", &self.neo4j_uri)
            .field("neo4j_password", &self.neo4j_password.as_ref().map(|_| "<redacted>"))
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GraphOpts {
    /// URI to connect to: the flag if given, otherwise the settings file.
    pub fn uri(&self, connection: &ConnectionSettings) -> String {
        self.neo4j_uri
            .clone()
            .unwrap_or_else(|| connection.uri.clone())
    }

    /// Credentials for the graph database. A password is required unless
    /// running against the in-memory graph.
    pub fn credentials(&self, connection: &ConnectionSettings) -> anyhow::Result<Credentials> {
        let password = match (&self.neo4j_password, self.dry_run) {
            (Some(password), _) => password.clone(),
            (None, true) => String::new(),
            (None, false) => anyhow::bail!(
                "No Neo4j password given: pass --neo4j-password or set NEO4J_PASSWORD"
            ),
        };
        Ok(Credentials {
            username: connection.username.clone(),
            password,
            database: connection.database.clone(),
        })
    }
}
