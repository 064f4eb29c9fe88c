//! Composition root: wires the vault, graph backend, runner, queue and
//! history together.

use crate::config::Settings;
use crate::GraphOpts;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use graph_sink::{GraphConnector, MemoryConnector, MemoryGraph};
use job_history::{FilesystemHistoryStore, HistoryEntry, HistoryStore, MemoryHistoryStore};
use neo4j_sink::Neo4jConnector;
use std::sync::Arc;
use sync_core::SyncKind;
use sync_engine::{Infrastructure, QueueManager, StateHub, SyncJobRunner};
use vault_source::FilesystemVault;

pub struct App {
    pub settings: Settings,
    pub hub: Arc<StateHub>,
    pub runner: Arc<SyncJobRunner>,
    pub manager: QueueManager,
    /// Set when running against the in-memory graph.
    pub memory_graph: Option<MemoryGraph>,
    started_at: DateTime<Utc>,
}

impl App {
    pub async fn build(settings: Settings, opts: &GraphOpts) -> Result<Self> {
        let vault = FilesystemVault::open(&settings.vault_root)
            .with_context(|| format!("Failed to open vault {}", settings.vault_root.display()))?;

        let credentials = opts.credentials(&settings.connection)?;
        let (connector, uri, memory_graph): (Arc<dyn GraphConnector>, String, Option<MemoryGraph>) =
            if opts.dry_run {
                tracing::info!("Dry run: syncing into an in-memory graph");
                let graph = MemoryGraph::new();
                (
                    Arc::new(MemoryConnector::new(graph.clone())) as Arc<dyn GraphConnector>,
                    "memory://dry-run".to_string(),
                    Some(graph),
                )
            } else {
                (
                    Arc::new(Neo4jConnector::new(settings.connection.base_label.clone()))
                        as Arc<dyn GraphConnector>,
                    opts.uri(&settings.connection),
                    None,
                )
            };

        let history_store: Arc<dyn HistoryStore> = if opts.dry_run {
            Arc::new(MemoryHistoryStore::new())
        } else {
            Arc::new(FilesystemHistoryStore::new(settings.history_path.clone()))
        };

        let hub = StateHub::new();
        let infra = Arc::new(Infrastructure::new(connector, uri, credentials));
        let runner = Arc::new(SyncJobRunner::new(
            infra,
            Arc::new(vault),
            hub.clone(),
            settings.plan(),
        ));
        let manager = QueueManager::new(hub.clone(), runner.clone(), history_store)
            .await
            .context("Failed to load job history")?;

        Ok(Self {
            settings,
            hub,
            runner,
            manager,
            memory_graph,
            started_at: Utc::now(),
        })
    }

    /// Verify connectivity with a round-trip query.
    pub async fn check(&self) -> Result<()> {
        let infra = self.runner.infrastructure();
        let result = infra.connect().await;
        infra.close().await;
        result
    }

    /// Queue a job of `kind` for `names`, or a full job when `names` is empty.
    /// Returns `false` when there was nothing to queue.
    pub fn enqueue(&self, kind: SyncKind, names: Vec<String>) -> bool {
        if names.is_empty() {
            self.manager
                .enqueue_full_kind(kind, &self.runner.plan())
                .is_some()
        } else {
            self.manager.enqueue(kind, names);
            true
        }
    }

    /// Queue full jobs for every kind. Returns how many were queued.
    pub fn enqueue_all(&self) -> usize {
        self.manager.enqueue_full(&self.runner.plan()).len()
    }

    /// Wait for the queue to drain. Ctrl+C drops queued jobs and cancels the
    /// running one. Returns the entries of jobs this process ran, oldest
    /// first.
    pub async fn drain(&self) -> Result<Vec<HistoryEntry>> {
        tokio::select! {
            _ = self.manager.wait_idle() => {}
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to install CTRL+C signal handler")?;
                tracing::info!("Received interrupt signal (Ctrl+C), cancelling");
                for item in self.hub.queue().queue {
                    self.manager.remove(&item.id);
                }
                self.runner.cancel().await;
                self.manager.wait_idle().await;
            }
        }

        let mut entries: Vec<HistoryEntry> = self
            .manager
            .history()
            .await
            .into_iter()
            .filter(|entry| entry.started_at >= self.started_at)
            .collect();
        entries.reverse();
        Ok(entries)
    }
}
