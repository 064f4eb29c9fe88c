//! Filesystem-based history storage implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::entry::HistoryEntry;
use crate::log::HistoryLog;
use crate::store::HistoryStore;

/// Stores the history log as a single pretty-printed JSON array.
pub struct FilesystemHistoryStore {
    path: PathBuf,
}

impl FilesystemHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for FilesystemHistoryStore {
    async fn load(&self) -> Result<HistoryLog> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(HistoryLog::new());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read history file {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(HistoryLog::new());
        }
        let entries: Vec<HistoryEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse history file {}", self.path.display()))?;
        Ok(HistoryLog::from_entries(entries))
    }

    async fn save(&self, log: &HistoryLog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(log)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write history file {}", self.path.display()))?;
        tracing::debug!(
            "Stored {} history entries to {}",
            log.len(),
            self.path.display()
        );
        Ok(())
    }
}
