//! Document store collaborators for vault-graph-sync.
//!
//! The sync engine reads records through the [`DocumentStore`] trait. Two
//! implementations are provided:
//!
//! - [`FilesystemVault`] - a directory of markdown notes with YAML front matter
//! - [`MemoryVault`] - records held in memory, used by tests
//!
//! Record identifiers are vault-relative, `/`-separated paths such as
//! `projects/alpha.md`.

mod error;
mod filesystem;
pub mod frontmatter;
pub mod links;
mod memory;

pub use error::VaultError;
pub use filesystem::{scan_vault, FilesystemVault, NOTE_EXTENSION};
pub use memory::MemoryVault;

use std::collections::HashSet;

/// Front matter of one record.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Tag and location facts used by label rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsAndPath {
    /// Front matter and inline tags, without `#`, de-duplicated.
    pub tags: HashSet<String>,
    pub path: String,
}

/// Read access to the source records.
pub trait DocumentStore: Send + Sync {
    /// Every record in the store, sorted.
    fn list_records(&self) -> Result<Vec<String>, VaultError>;

    /// Front matter of a record, or `None` when the record has none or does
    /// not exist.
    fn fields(&self, record_id: &str) -> Option<Fields>;

    /// Turn a raw reference value (a link, a plain name, or a list of them)
    /// into record identifiers. Targets that do not exist still yield an
    /// identifier so a placeholder node can be created for them.
    fn resolve_reference(&self, value: &serde_json::Value, from: &str) -> Vec<String>;

    fn tags_and_path(&self, record_id: &str) -> TagsAndPath;
}

/// Display name of a record: its file stem.
pub fn display_name(record_id: &str) -> String {
    let file = record_id.rsplit('/').next().unwrap_or(record_id);
    file.strip_suffix(&format!(".{NOTE_EXTENSION}"))
        .unwrap_or(file)
        .to_string()
}
