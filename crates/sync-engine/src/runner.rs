//! Executes one queued job end to end.

use crate::config::SyncPlan;
use crate::infra::Infrastructure;
use crate::state::StateHub;
use crate::writers::{LabelWriter, NodePropertyWriter, RelationshipWriter, WriterContext};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use sync_core::{MigrationState, SyncKind, SyncProgress, SyncQueueItem, SyncReport, SyncStatus};
use vault_source::DocumentStore;

/// Executes queued jobs for the queue manager.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run `item` to completion. Per-record failures are part of the report;
    /// an `Err` means the job itself failed (connection, commit, ...).
    async fn run(&self, item: &SyncQueueItem) -> Result<SyncReport>;
}

/// Runs jobs against a graph store: connect, begin, write, commit or roll
/// back, close.
pub struct SyncJobRunner {
    infra: Arc<Infrastructure>,
    store: Arc<dyn DocumentStore>,
    hub: Arc<StateHub>,
    plan: RwLock<SyncPlan>,
}

impl SyncJobRunner {
    pub fn new(
        infra: Arc<Infrastructure>,
        store: Arc<dyn DocumentStore>,
        hub: Arc<StateHub>,
        plan: SyncPlan,
    ) -> Self {
        Self {
            infra,
            store,
            hub,
            plan: RwLock::new(plan),
        }
    }

    pub fn infrastructure(&self) -> &Arc<Infrastructure> {
        &self.infra
    }

    /// Copy of the current plan.
    pub fn plan(&self) -> SyncPlan {
        match self.plan.read() {
            Ok(plan) => plan.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the plan. Jobs already running keep the plan they started with.
    pub fn set_plan(&self, plan: SyncPlan) {
        match self.plan.write() {
            Ok(mut current) => *current = plan,
            Err(poisoned) => *poisoned.into_inner() = plan,
        }
    }

    pub fn pause(&self) {
        if self.infra.pause() {
            tracing::info!("Sync paused");
            self.hub.update_migration(|m| m.paused = true);
        }
    }

    pub fn resume(&self) {
        if self.infra.resume() {
            tracing::info!("Sync resumed");
            self.hub.update_migration(|m| m.paused = false);
        }
    }

    /// Cancel the running job. Its transaction is rolled back.
    pub async fn cancel(&self) {
        self.infra.cancel().await;
        self.hub.update_migration(|m| {
            m.cancelled = true;
            m.paused = false;
        });
    }

    async fn execute(&self, item: &SyncQueueItem, plan: &SyncPlan) -> Result<SyncReport> {
        let records = self.infra.list_records(self.store.as_ref())?;
        tracing::debug!("{} records in vault", records.len());

        self.hub.update_migration(|m| {
            m.progress = Some(SyncProgress::new(SyncStatus::Connecting, 0, records.len()))
        });
        self.infra.connect().await?;
        self.infra.begin().await?;

        let ctx = WriterContext::new(&self.infra, self.store.as_ref(), &self.hub);
        let filter = (!item.full).then_some(&item.target_set);
        let outcome = match item.kind {
            SyncKind::NodeProperty => {
                let mappings = plan.mappings.node_properties(filter);
                NodePropertyWriter::new(ctx).run(&records, &mappings).await
            }
            SyncKind::Relationship => {
                let mappings = plan.mappings.relationships(filter);
                RelationshipWriter::new(ctx).run(&records, &mappings).await
            }
            SyncKind::Label => {
                let rules = plan.label_rules(filter);
                LabelWriter::new(ctx, plan.batch_size)
                    .run(&records, &rules)
                    .await
            }
        };

        match outcome {
            Ok(report) if report.cancelled => Ok(report),
            Ok(report) => {
                // A cancel can land while the last record is in flight.
                self.infra.wait_if_paused().await;
                if self.infra.is_cancelled() {
                    return self.discard(item.kind).await;
                }
                if let Err(e) = self.infra.commit().await {
                    if self.infra.is_cancelled() {
                        return self.discard(item.kind).await;
                    }
                    return Err(e).with_context(|| format!("{} could not be committed", item.kind));
                }
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback) = self.infra.rollback().await {
                    tracing::warn!("Rollback after failed {} failed: {rollback:#}", item.kind);
                }
                Err(e)
            }
        }
    }

    /// Cancelled after the writer finished: drop everything it wrote.
    async fn discard(&self, kind: SyncKind) -> Result<SyncReport> {
        tracing::info!("{kind} cancelled before commit, rolling back");
        if let Err(e) = self.infra.rollback().await {
            tracing::warn!("Rollback after cancellation failed: {e:#}");
        }
        Ok(SyncReport::cancelled(kind))
    }
}

#[async_trait]
impl JobRunner for SyncJobRunner {
    async fn run(&self, item: &SyncQueueItem) -> Result<SyncReport> {
        let plan = self.plan();
        self.infra.control().reset_cancel();
        let paused = self.infra.is_paused();
        self.hub.update_migration(|m| {
            *m = MigrationState {
                running: true,
                paused,
                cancelled: false,
                progress: Some(SyncProgress::new(SyncStatus::Scanning, 0, 0)),
            }
        });

        let result = self.execute(item, &plan).await;
        self.infra.close().await;

        let cancelled = matches!(&result, Ok(report) if report.cancelled);
        self.hub.update_migration(|m| {
            m.running = false;
            m.cancelled = cancelled;
            m.progress = None;
        });
        result
    }
}
