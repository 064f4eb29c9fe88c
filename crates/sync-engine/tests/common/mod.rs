//! Shared fixtures for sync-engine integration tests.

#![allow(dead_code)]

use graph_sink::{Credentials, MemoryConnector, MemoryGraph};
use job_history::MemoryHistoryStore;
use std::sync::Arc;
use sync_core::{Direction, MappingKind, PropertyMapping, TargetType};
use sync_engine::{Infrastructure, QueueManager, StateHub, SyncJobRunner, SyncPlan};
use vault_source::MemoryVault;

pub struct Harness {
    pub graph: MemoryGraph,
    pub hub: Arc<StateHub>,
    pub runner: Arc<SyncJobRunner>,
    pub manager: QueueManager,
}

pub async fn harness(vault: MemoryVault, plan: SyncPlan) -> Harness {
    harness_with_graph(MemoryGraph::new(), vault, plan).await
}

pub async fn harness_with_graph(graph: MemoryGraph, vault: MemoryVault, plan: SyncPlan) -> Harness {
    let hub = StateHub::new();
    let infra = Arc::new(Infrastructure::new(
        Arc::new(MemoryConnector::new(graph.clone())),
        "memory://test",
        Credentials {
            username: "neo4j".to_string(),
            password: "secret".to_string(),
            database: None,
        },
    ));
    let runner = Arc::new(SyncJobRunner::new(
        infra,
        Arc::new(vault),
        hub.clone(),
        plan,
    ));
    let manager = QueueManager::new(
        hub.clone(),
        runner.clone(),
        Arc::new(MemoryHistoryStore::new()),
    )
    .await
    .expect("in-memory history loads");

    Harness {
        graph,
        hub,
        runner,
        manager,
    }
}

pub fn node_property(target: &str, target_type: TargetType) -> PropertyMapping {
    PropertyMapping {
        enabled: true,
        kind: MappingKind::NodeProperty {
            target_property_name: target.to_string(),
            target_type,
        },
    }
}

pub fn relationship(rel_type: &str, direction: Direction) -> PropertyMapping {
    PropertyMapping {
        enabled: true,
        kind: MappingKind::Relationship {
            relationship_type: rel_type.to_string(),
            direction,
        },
    }
}
