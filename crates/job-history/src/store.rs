//! History storage trait.

use crate::log::HistoryLog;
use anyhow::Result;
use async_trait::async_trait;

/// Persistence backend for the history log.
///
/// Implementations:
/// - Filesystem storage (`FilesystemHistoryStore`)
/// - In-memory storage (`MemoryHistoryStore`)
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the stored log. A store that has never been written returns an
    /// empty log.
    async fn load(&self) -> Result<HistoryLog>;

    /// Replace the stored log.
    async fn save(&self, log: &HistoryLog) -> Result<()>;
}
