//! Writers that turn vault records into graph writes.
//!
//! Each writer walks the record list inside the job's transaction, checking
//! in with the run control at every record boundary. On cancellation it rolls
//! the transaction back and returns [`SyncReport::cancelled`]; nothing written
//! so far becomes visible.

mod labels;
mod node_properties;
mod relationships;

pub use labels::LabelWriter;
pub use node_properties::NodePropertyWriter;
pub use relationships::RelationshipWriter;

use crate::infra::Infrastructure;
use crate::state::StateHub;
use anyhow::Result;
use sync_core::{SyncKind, SyncProgress, SyncReport, SyncStatus};
use vault_source::DocumentStore;

/// Collaborators a writer needs for one run.
#[derive(Clone, Copy)]
pub struct WriterContext<'a> {
    pub infra: &'a Infrastructure,
    pub store: &'a dyn DocumentStore,
    pub hub: &'a StateHub,
}

impl<'a> WriterContext<'a> {
    pub fn new(infra: &'a Infrastructure, store: &'a dyn DocumentStore, hub: &'a StateHub) -> Self {
        Self { infra, store, hub }
    }

    /// Record boundary: wait out a pause, then report whether the run was
    /// cancelled.
    async fn should_stop(&self) -> bool {
        self.infra.wait_if_paused().await;
        self.infra.is_cancelled()
    }

    /// Roll back and produce the cancelled result.
    async fn abort(&self, kind: SyncKind) -> Result<SyncReport> {
        tracing::info!("{kind} cancelled, rolling back");
        if let Err(e) = self.infra.rollback().await {
            tracing::warn!("Rollback after cancellation failed: {e:#}");
        }
        Ok(SyncReport::cancelled(kind))
    }

    fn progress(&self, status: SyncStatus, current: usize, total: usize, record: &str) {
        self.hub.update_migration(|m| {
            m.progress = Some(SyncProgress::new(status, current, total).with_record(record));
        });
    }
}
