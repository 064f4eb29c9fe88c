//! Queue manager: a single background worker draining the sync queue.

use crate::config::SyncPlan;
use crate::runner::JobRunner;
use crate::state::StateHub;
use anyhow::Result;
use chrono::Utc;
use job_history::{HistoryEntry, HistoryLog, HistoryStore};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use sync_core::{SyncKind, SyncQueueItem};
use tokio::sync::watch;

/// Accepts sync requests and runs them one at a time.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct QueueManager {
    inner: Arc<Inner>,
}

struct Inner {
    hub: Arc<StateHub>,
    runner: Arc<dyn JobRunner>,
    history_store: Arc<dyn HistoryStore>,
    history: tokio::sync::Mutex<HistoryLog>,
    worker_active: Mutex<bool>,
    idle: watch::Sender<bool>,
}

impl QueueManager {
    /// Create a manager, loading previous history from `history_store`.
    pub async fn new(
        hub: Arc<StateHub>,
        runner: Arc<dyn JobRunner>,
        history_store: Arc<dyn HistoryStore>,
    ) -> Result<Self> {
        let history = history_store.load().await?;
        let (idle, _rx) = watch::channel(true);
        Ok(Self {
            inner: Arc::new(Inner {
                hub,
                runner,
                history_store,
                history: tokio::sync::Mutex::new(history),
                worker_active: Mutex::new(false),
                idle,
            }),
        })
    }

    pub fn hub(&self) -> &Arc<StateHub> {
        &self.inner.hub
    }

    /// Queue a partial job of `kind` for `names`. Returns the id of the queued
    /// item that covers them.
    pub fn enqueue<I, S>(&self, kind: SyncKind, names: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let id = self.inner.hub.update_queue(|q| q.enqueue(kind, names));
        tracing::debug!("Queued {kind} as {id}");
        self.ensure_worker();
        id
    }

    /// Queue full jobs for every kind that has something enabled in `plan`.
    /// Returns the ids of the items covering each kind.
    pub fn enqueue_full(&self, plan: &SyncPlan) -> Vec<(SyncKind, String)> {
        SyncKind::ALL
            .into_iter()
            .filter_map(|kind| self.enqueue_full_kind(kind, plan).map(|id| (kind, id)))
            .collect()
    }

    /// Queue a full job of one kind. Returns `None` when `plan` has nothing
    /// of that kind enabled.
    pub fn enqueue_full_kind(&self, kind: SyncKind, plan: &SyncPlan) -> Option<String> {
        let targets = plan.enabled_targets(kind);
        if targets.is_empty() {
            tracing::debug!("Nothing enabled for {kind}, skipping");
            return None;
        }
        let id = self.inner.hub.update_queue(|q| q.enqueue_full(kind, targets));
        tracing::debug!("Queued full {kind} as {id}");
        self.ensure_worker();
        Some(id)
    }

    /// Remove a queued job. The running job cannot be removed.
    pub fn remove(&self, id: &str) -> bool {
        self.inner.hub.update_queue(|q| q.remove(id))
    }

    /// Add `name` to the running job if it is a full job of `kind`. Names the
    /// job did not start with are synced by a follow-up job once it finishes.
    pub fn add_to_active_full_job(&self, kind: SyncKind, name: &str) -> bool {
        self.inner
            .hub
            .update_queue(|q| q.add_to_current_full(kind, name))
    }

    /// Resolve once the queue has drained and no job is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.idle.subscribe();
        let _ = rx.wait_for(|idle| *idle).await;
    }

    /// Finished jobs, newest first.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.inner.history.lock().await.entries().to_vec()
    }

    fn ensure_worker(&self) {
        let mut active = lock(&self.inner.worker_active);
        if *active {
            return;
        }
        *active = true;
        self.inner.idle.send_replace(false);

        let inner = self.inner.clone();
        tokio::spawn(async move { inner.run_worker().await });
    }
}

fn lock(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(|e| e.into_inner())
}

impl Inner {
    async fn run_worker(&self) {
        tracing::debug!("Queue worker started");
        loop {
            let Some(item) = self.hub.update_queue(|q| q.start_next()) else {
                let mut active = lock(&self.worker_active);
                if self.hub.queue().queue.is_empty() {
                    *active = false;
                    self.idle.send_replace(true);
                    break;
                }
                continue;
            };
            self.process(item).await;
        }
        tracing::debug!("Queue worker stopped");
    }

    async fn process(&self, item: SyncQueueItem) {
        tracing::info!(
            "Starting {} ({}): {}",
            item.kind,
            if item.full { "full" } else { "partial" },
            item.target_set.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        let started_at = Utc::now();
        let clock = Instant::now();
        let result = self.runner.run(&item).await;
        let elapsed = clock.elapsed();

        let entry = match &result {
            Ok(report) => {
                if report.cancelled {
                    tracing::info!("{} cancelled after {:?}", item.kind, elapsed);
                } else {
                    tracing::info!(
                        "{} finished in {:?}: {} succeeded, {} errors",
                        item.kind,
                        elapsed,
                        report.total_success(),
                        report.total_errors()
                    );
                }
                HistoryEntry::from_report(&item, started_at, elapsed, report)
            }
            Err(e) => {
                tracing::error!("{} failed: {e:#}", item.kind);
                HistoryEntry::failed(&item, started_at, elapsed, e)
            }
        };
        self.record(entry).await;

        let finished = self.hub.update_queue(|q| q.finish_current());
        let late: BTreeSet<String> = finished
            .map(|done| done.target_set.difference(&item.target_set).cloned().collect())
            .unwrap_or_default();
        if !late.is_empty() {
            tracing::info!(
                "Queueing {} names added to the running {} job",
                late.len(),
                item.kind
            );
            self.hub.update_queue(|q| q.enqueue(item.kind, late));
        }
    }

    async fn record(&self, entry: HistoryEntry) {
        let mut history = self.history.lock().await;
        history.push(entry);
        if let Err(e) = self.history_store.save(&history).await {
            tracing::warn!("Failed to persist job history: {e:#}");
        }
    }
}
