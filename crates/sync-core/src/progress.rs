//! Progress and migration state published while a job runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase a running sync is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Scanning,
    Connecting,
    CreatingNodes,
    UpdatingProperties,
    CreatingRelationships,
    ApplyingLabels,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Scanning => "scanning",
            SyncStatus::Connecting => "connecting",
            SyncStatus::CreatingNodes => "creating_nodes",
            SyncStatus::UpdatingProperties => "updating_properties",
            SyncStatus::CreatingRelationships => "creating_relationships",
            SyncStatus::ApplyingLabels => "applying_labels",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub current: usize,
    pub total: usize,
    pub status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_record: Option<String>,
}

impl SyncProgress {
    pub fn new(status: SyncStatus, current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            status,
            current_record: None,
        }
    }

    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.current_record = Some(record.into());
        self
    }
}

/// State of the current run.
///
/// A run ends either committed (`running == false`) or rolled back
/// (`cancelled == true`, then reset when the next job starts).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationState {
    pub running: bool,
    pub paused: bool,
    pub cancelled: bool,
    pub progress: Option<SyncProgress>,
}
