//! Job history for vault-graph-sync
//!
//! Every job the queue manager finishes, whether it succeeded, failed or was
//! cancelled, becomes one [`HistoryEntry`]. Entries live in a bounded
//! [`HistoryLog`] (newest first, at most [`MAX_HISTORY_ENTRIES`]) that is
//! persisted through a [`HistoryStore`].
//!
//! ## Storage Backends
//!
//! - `FilesystemHistoryStore` - one pretty-printed JSON file
//! - `MemoryHistoryStore` - kept in memory, used by tests and `--dry-run`

mod entry;
mod filesystem;
mod log;
mod memory;
pub mod store;

#[cfg(test)]
mod tests;

pub use entry::{HistoryEntry, PropertyCounts, CANCELLED_MESSAGE};
pub use filesystem::FilesystemHistoryStore;
pub use log::{HistoryLog, MAX_HISTORY_ENTRIES};
pub use memory::MemoryHistoryStore;
pub use store::HistoryStore;
