//! In-memory graph store.
//!
//! Transactions work on a private copy of the graph that replaces the shared
//! state on commit, so a rolled-back transaction leaves no trace. Faults can
//! be injected to exercise the engine's error paths.

use crate::traits::{Credentials, GraphConnector, GraphSession, GraphTransaction};
use crate::write::GraphWrite;
use anyhow::{anyhow, bail, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use sync_core::PropertyValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryNode {
    pub name: String,
    pub properties: BTreeMap<String, PropertyValue>,
    pub labels: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryRelationship {
    pub from: String,
    pub rel_type: String,
    pub to: String,
}

/// Committed contents of a [`MemoryGraph`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphState {
    pub nodes: BTreeMap<String, MemoryNode>,
    pub relationships: BTreeSet<MemoryRelationship>,
}

impl GraphState {
    fn apply(&mut self, write: &GraphWrite) -> Result<()> {
        match write {
            GraphWrite::UpsertNode {
                id,
                name,
                properties,
            } => {
                let node = self.nodes.entry(id.clone()).or_default();
                node.name = name.clone();
                node.properties
                    .extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            GraphWrite::UpsertPlaceholder { id, name } => {
                self.nodes.entry(id.clone()).or_insert_with(|| MemoryNode {
                    name: name.clone(),
                    ..MemoryNode::default()
                });
            }
            GraphWrite::UpsertRelationship { from, to, rel_type } => {
                for endpoint in [from, to] {
                    if !self.nodes.contains_key(endpoint) {
                        bail!("Relationship endpoint not found: {endpoint}");
                    }
                }
                self.relationships.insert(MemoryRelationship {
                    from: from.clone(),
                    rel_type: rel_type.to_string(),
                    to: to.clone(),
                });
            }
            GraphWrite::SetLabel { id, label } => {
                let node = self
                    .nodes
                    .get_mut(id)
                    .ok_or_else(|| anyhow!("Cannot set label {label}: node not found: {id}"))?;
                node.labels.insert(label.to_string());
            }
        }
        Ok(())
    }
}

type WritePredicate = Arc<dyn Fn(&GraphWrite) -> bool + Send + Sync>;

#[derive(Default)]
struct Faults {
    connect: Option<String>,
    commit: Option<String>,
    lookups: Option<String>,
    writes: Vec<(WritePredicate, String)>,
}

#[derive(Default)]
struct Inner {
    state: GraphState,
    faults: Faults,
    commits: usize,
    rollbacks: usize,
    writes: usize,
}

/// Shared handle to an in-memory graph.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("In-memory graph lock poisoned"))
    }

    fn lock_unpoisoned(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the committed graph.
    pub fn snapshot(&self) -> GraphState {
        self.lock_unpoisoned().state.clone()
    }

    pub fn node(&self, id: &str) -> Option<MemoryNode> {
        self.lock_unpoisoned().state.nodes.get(id).cloned()
    }

    pub fn relationships(&self) -> BTreeSet<MemoryRelationship> {
        self.lock_unpoisoned().state.relationships.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.lock_unpoisoned().commits
    }

    pub fn rollback_count(&self) -> usize {
        self.lock_unpoisoned().rollbacks
    }

    /// Number of writes attempted across all transactions.
    pub fn write_count(&self) -> usize {
        self.lock_unpoisoned().writes
    }

    /// Insert a committed node directly, bypassing transactions.
    pub fn seed_node(&self, id: &str, name: &str) {
        self.lock_unpoisoned().state.nodes.insert(
            id.to_string(),
            MemoryNode {
                name: name.to_string(),
                ..MemoryNode::default()
            },
        );
    }

    /// Make connect and ping fail with `message`.
    pub fn fail_connect(&self, message: impl Into<String>) {
        self.lock_unpoisoned().faults.connect = Some(message.into());
    }

    /// Make every commit fail with `message`.
    pub fn fail_commit(&self, message: impl Into<String>) {
        self.lock_unpoisoned().faults.commit = Some(message.into());
    }

    /// Make batch existence lookups fail with `message`.
    pub fn fail_lookups(&self, message: impl Into<String>) {
        self.lock_unpoisoned().faults.lookups = Some(message.into());
    }

    /// Fail every write matching `predicate` with `message`.
    pub fn fail_writes_when<F>(&self, predicate: F, message: impl Into<String>)
    where
        F: Fn(&GraphWrite) -> bool + Send + Sync + 'static,
    {
        self.lock_unpoisoned()
            .faults
            .writes
            .push((Arc::new(predicate), message.into()));
    }

    /// Fail every write anchored on node `id` with `message`.
    pub fn fail_writes_for(&self, id: &str, message: impl Into<String>) {
        let id = id.to_string();
        self.fail_writes_when(move |w| w.node_id() == id, message);
    }

    pub fn clear_faults(&self) {
        self.lock_unpoisoned().faults = Faults::default();
    }
}

/// Connector handing out sessions on a shared [`MemoryGraph`].
#[derive(Clone, Default)]
pub struct MemoryConnector {
    graph: MemoryGraph,
}

impl MemoryConnector {
    pub fn new(graph: MemoryGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &MemoryGraph {
        &self.graph
    }
}

#[async_trait::async_trait]
impl GraphConnector for MemoryConnector {
    async fn connect(&self, uri: &str, credentials: &Credentials) -> Result<Box<dyn GraphSession>> {
        tracing::debug!(
            "Opening in-memory graph session for {} as {}",
            uri,
            credentials.username
        );
        if let Some(message) = &self.graph.lock()?.faults.connect {
            bail!("{message}");
        }
        Ok(Box::new(MemorySession {
            graph: self.graph.clone(),
        }))
    }
}

struct MemorySession {
    graph: MemoryGraph,
}

#[async_trait::async_trait]
impl GraphSession for MemorySession {
    async fn ping(&self) -> Result<()> {
        match &self.graph.lock()?.faults.connect {
            Some(message) => bail!("{message}"),
            None => Ok(()),
        }
    }

    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        let working = self.graph.lock()?.state.clone();
        Ok(Box::new(MemoryTransaction {
            graph: self.graph.clone(),
            working: Some(working),
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct MemoryTransaction {
    graph: MemoryGraph,
    working: Option<GraphState>,
}

impl MemoryTransaction {
    fn working(&mut self) -> Result<&mut GraphState> {
        self.working
            .as_mut()
            .ok_or_else(|| anyhow!("Transaction is no longer open"))
    }
}

#[async_trait::async_trait]
impl GraphTransaction for MemoryTransaction {
    async fn write(&mut self, write: &GraphWrite) -> Result<()> {
        let failure = {
            let mut inner = self.graph.lock()?;
            inner.writes += 1;
            inner
                .faults
                .writes
                .iter()
                .find(|(predicate, _)| predicate(write))
                .map(|(_, message)| message.clone())
        };
        if let Some(message) = failure {
            bail!("{message}");
        }
        self.working()?.apply(write)
    }

    async fn node_exists(&mut self, id: &str) -> Result<bool> {
        Ok(self.working()?.nodes.contains_key(id))
    }

    async fn existing_nodes(&mut self, ids: &[String]) -> Result<HashSet<String>> {
        if let Some(message) = &self.graph.lock()?.faults.lookups {
            bail!("{message}");
        }
        let working = self.working()?;
        Ok(ids
            .iter()
            .filter(|id| working.nodes.contains_key(*id))
            .cloned()
            .collect())
    }

    async fn commit(&mut self) -> Result<()> {
        let working = self
            .working
            .take()
            .ok_or_else(|| anyhow!("Transaction is no longer open"))?;
        let mut inner = self.graph.lock()?;
        if let Some(message) = &inner.faults.commit {
            bail!("{message}");
        }
        inner.state = working;
        inner.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.working.take().is_none() {
            bail!("Transaction is no longer open");
        }
        self.graph.lock()?.rollbacks += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{LabelName, RelationshipType};

    async fn begin(graph: &MemoryGraph) -> Box<dyn GraphTransaction> {
        let session = MemoryConnector::new(graph.clone())
            .connect("memory://", &Credentials::default())
            .await
            .unwrap();
        session.begin().await.unwrap()
    }

    fn upsert(id: &str) -> GraphWrite {
        GraphWrite::UpsertNode {
            id: id.to_string(),
            name: id.trim_end_matches(".md").to_string(),
            properties: BTreeMap::from([("rank".to_string(), PropertyValue::Integer(1))]),
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let graph = MemoryGraph::new();
        let mut txn = begin(&graph).await;
        txn.write(&upsert("a.md")).await.unwrap();
        assert!(graph.node("a.md").is_none());

        txn.commit().await.unwrap();
        let node = graph.node("a.md").unwrap();
        assert_eq!(node.name, "a");
        assert_eq!(node.properties["rank"], PropertyValue::Integer(1));
        assert_eq!(graph.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let graph = MemoryGraph::new();
        let before = graph.snapshot();
        let mut txn = begin(&graph).await;
        txn.write(&upsert("a.md")).await.unwrap();
        txn.rollback().await.unwrap();

        assert_eq!(graph.snapshot(), before);
        assert!(txn.commit().await.is_err());
    }

    #[tokio::test]
    async fn test_placeholder_does_not_overwrite() {
        let graph = MemoryGraph::new();
        graph.seed_node("a.md", "Alpha");
        let mut txn = begin(&graph).await;
        txn.write(&GraphWrite::UpsertPlaceholder {
            id: "a.md".to_string(),
            name: "a".to_string(),
        })
        .await
        .unwrap();
        txn.commit().await.unwrap();
        assert_eq!(graph.node("a.md").unwrap().name, "Alpha");
    }

    #[tokio::test]
    async fn test_relationship_requires_endpoints() {
        let graph = MemoryGraph::new();
        graph.seed_node("a.md", "a");
        let mut txn = begin(&graph).await;
        let rel = GraphWrite::UpsertRelationship {
            from: "a.md".to_string(),
            to: "b.md".to_string(),
            rel_type: RelationshipType::parse("LINKS_TO").unwrap(),
        };
        assert!(txn.write(&rel).await.is_err());
        assert!(!txn.node_exists("b.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let graph = MemoryGraph::new();
        graph.seed_node("a.md", "a");
        graph.fail_writes_for("a.md", "Neo.ClientError.Statement.SyntaxError");
        let mut txn = begin(&graph).await;
        let err = txn
            .write(&GraphWrite::SetLabel {
                id: "a.md".to_string(),
                label: LabelName::sanitize("Project").unwrap(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SyntaxError"));
        assert_eq!(graph.write_count(), 1);
    }
}
