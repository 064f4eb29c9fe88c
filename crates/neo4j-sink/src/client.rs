//! `neo4rs`-backed connector, session and transaction.

use crate::cypher::{render_existing_nodes, render_node_exists, render_write, Statement};
use anyhow::{Context, Result};
use graph_sink::{Credentials, GraphConnector, GraphSession, GraphTransaction, GraphWrite};
use neo4rs::{query, BoltType, ConfigBuilder, Graph, Query, Txn};
use std::collections::HashSet;
use sync_core::PropertyValue;

/// Default label carried by every synced node.
pub const DEFAULT_BASE_LABEL: &str = "Note";

/// Connector for Neo4j servers.
#[derive(Debug, Clone)]
pub struct Neo4jConnector {
    base_label: String,
}

impl Neo4jConnector {
    pub fn new(base_label: impl Into<String>) -> Self {
        Self {
            base_label: base_label.into(),
        }
    }
}

impl Default for Neo4jConnector {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_LABEL)
    }
}

#[async_trait::async_trait]
impl GraphConnector for Neo4jConnector {
    async fn connect(&self, uri: &str, credentials: &Credentials) -> Result<Box<dyn GraphSession>> {
        tracing::debug!("Connecting to Neo4j at: {}", uri);
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(credentials.username.clone())
            .password(credentials.password.clone())
            .db(credentials
                .database
                .clone()
                .unwrap_or_else(|| "neo4j".to_string()))
            .build()
            .context("Invalid Neo4j connection configuration")?;

        let graph = Graph::connect(config).context("Failed to connect to Neo4j")?;
        Ok(Box::new(Neo4jSession {
            graph,
            base_label: self.base_label.clone(),
        }))
    }
}

struct Neo4jSession {
    graph: Graph,
    base_label: String,
}

#[async_trait::async_trait]
impl GraphSession for Neo4jSession {
    async fn ping(&self) -> Result<()> {
        self.graph
            .run(query("RETURN 1"))
            .await
            .context("Neo4j connectivity check failed")?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        let txn = self
            .graph
            .start_txn()
            .await
            .context("Failed to start Neo4j transaction")?;
        Ok(Box::new(Neo4jTransaction {
            txn: Some(txn),
            base_label: self.base_label.clone(),
        }))
    }

    async fn close(&self) -> Result<()> {
        // Connections are pooled by the driver and released on drop.
        Ok(())
    }
}

struct Neo4jTransaction {
    txn: Option<Txn>,
    base_label: String,
}

impl Neo4jTransaction {
    fn txn(&mut self) -> Result<&mut Txn> {
        self.txn
            .as_mut()
            .context("Neo4j transaction is no longer open")
    }
}

#[async_trait::async_trait]
impl GraphTransaction for Neo4jTransaction {
    async fn write(&mut self, write: &GraphWrite) -> Result<()> {
        let statement = render_write(write, &self.base_label);
        tracing::debug!("Neo4j write: {}", statement.text);
        self.txn()?.run(to_query(&statement)).await?;
        Ok(())
    }

    async fn node_exists(&mut self, id: &str) -> Result<bool> {
        let statement = render_node_exists(id, &self.base_label);
        let txn = self.txn()?;
        let mut result = txn.execute(to_query(&statement)).await?;
        match result.next(txn.handle()).await? {
            Some(row) => {
                let count: i64 = row
                    .get("count")
                    .map_err(|e| anyhow::anyhow!("Failed to read node count: {e}"))?;
                Ok(count > 0)
            }
            None => Ok(false),
        }
    }

    async fn existing_nodes(&mut self, ids: &[String]) -> Result<HashSet<String>> {
        let statement = render_existing_nodes(ids, &self.base_label);
        let txn = self.txn()?;
        let mut result = txn.execute(to_query(&statement)).await?;
        let mut existing = HashSet::new();
        while let Some(row) = result.next(txn.handle()).await? {
            let path: String = row
                .get("path")
                .map_err(|e| anyhow::anyhow!("Failed to read node path: {e}"))?;
            existing.insert(path);
        }
        Ok(existing)
    }

    async fn commit(&mut self) -> Result<()> {
        let txn = self
            .txn
            .take()
            .context("Neo4j transaction is no longer open")?;
        txn.commit()
            .await
            .context("Failed to commit Neo4j transaction")?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let txn = self
            .txn
            .take()
            .context("Neo4j transaction is no longer open")?;
        txn.rollback()
            .await
            .context("Failed to roll back Neo4j transaction")?;
        Ok(())
    }
}

fn to_query(statement: &Statement) -> Query {
    statement
        .params
        .iter()
        .fold(query(&statement.text), |q, (key, value)| {
            q.param(key, to_bolt(value))
        })
}

fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Boolean(b) => BoltType::from(*b),
        PropertyValue::Integer(i) => BoltType::from(*i),
        PropertyValue::Float(f) => BoltType::from(*f),
        PropertyValue::Date(s) | PropertyValue::DateTime(s) | PropertyValue::String(s) => {
            BoltType::from(s.clone())
        }
        PropertyValue::StringList(items) => BoltType::from(items.clone()),
    }
}
