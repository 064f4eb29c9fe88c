//! Connection and transaction infrastructure shared by the writers.
//!
//! One job runs inside one transaction. The infrastructure owns the session
//! and the live transaction; writers go through it for every read and write
//! and never hold the transaction themselves.

use crate::control::SyncControl;
use anyhow::{bail, Context, Result};
use graph_sink::{Credentials, GraphConnector, GraphSession, GraphTransaction, GraphWrite};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use vault_source::DocumentStore;

pub struct Infrastructure {
    connector: Arc<dyn GraphConnector>,
    uri: String,
    credentials: Credentials,
    control: SyncControl,
    session: Mutex<Option<Box<dyn GraphSession>>>,
    txn: Mutex<Option<Box<dyn GraphTransaction>>>,
}

impl Infrastructure {
    pub fn new(
        connector: Arc<dyn GraphConnector>,
        uri: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            connector,
            uri: uri.into(),
            credentials,
            control: SyncControl::new(),
            session: Mutex::new(None),
            txn: Mutex::new(None),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Handle for pausing or cancelling from outside the writer.
    pub fn control(&self) -> &SyncControl {
        &self.control
    }

    /// Sorted record identifiers of the document store.
    pub fn list_records(&self, store: &dyn DocumentStore) -> Result<Vec<String>> {
        let mut records = store.list_records().context("Failed to list vault records")?;
        records.sort();
        records.dedup();
        Ok(records)
    }

    /// Open a session and verify it with a round-trip query.
    pub async fn connect(&self) -> Result<()> {
        let session = self
            .connector
            .connect(&self.uri, &self.credentials)
            .await
            .with_context(|| format!("Failed to connect to graph database at {}", self.uri))?;
        session
            .ping()
            .await
            .with_context(|| format!("Graph database at {} did not respond", self.uri))?;
        tracing::debug!("Connected to {}", self.uri);

        if let Some(previous) = self.session.lock().await.replace(session) {
            if let Err(e) = previous.close().await {
                tracing::warn!("Failed to close previous session: {e:#}");
            }
        }
        Ok(())
    }

    pub async fn begin(&self) -> Result<()> {
        let guard = self.session.lock().await;
        let Some(session) = guard.as_ref() else {
            bail!("Cannot begin a transaction without a connection");
        };
        let txn = session
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut current = self.txn.lock().await;
        if current.is_some() {
            bail!("A transaction is already open");
        }
        *current = Some(txn);
        Ok(())
    }

    pub async fn write(&self, write: &GraphWrite) -> Result<()> {
        let mut txn = self.txn.lock().await;
        match txn.as_mut() {
            Some(txn) => txn.write(write).await,
            None => bail!("No open transaction"),
        }
    }

    pub async fn node_exists(&self, id: &str) -> Result<bool> {
        let mut txn = self.txn.lock().await;
        match txn.as_mut() {
            Some(txn) => txn.node_exists(id).await,
            None => bail!("No open transaction"),
        }
    }

    pub async fn existing_nodes(&self, ids: &[String]) -> Result<HashSet<String>> {
        let mut txn = self.txn.lock().await;
        match txn.as_mut() {
            Some(txn) => txn.existing_nodes(ids).await,
            None => bail!("No open transaction"),
        }
    }

    pub async fn commit(&self) -> Result<()> {
        let txn = self.txn.lock().await.take();
        match txn {
            Some(mut txn) => txn.commit().await.context("Failed to commit transaction"),
            None => bail!("No open transaction to commit"),
        }
    }

    /// Roll back the open transaction, if any.
    pub async fn rollback(&self) -> Result<()> {
        let txn = self.txn.lock().await.take();
        match txn {
            Some(mut txn) => txn
                .rollback()
                .await
                .context("Failed to roll back transaction"),
            None => Ok(()),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    pub fn pause(&self) -> bool {
        self.control.pause()
    }

    pub fn resume(&self) -> bool {
        self.control.resume()
    }

    /// Cancel the running job and roll back its transaction.
    ///
    /// If a writer is in the middle of a write the rollback is left to the
    /// writer, which sees the cancellation at its next record boundary.
    pub async fn cancel(&self) {
        self.control.cancel();
        let txn = match self.txn.try_lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(mut txn) = txn {
            match txn.rollback().await {
                Ok(()) => tracing::info!("Rolled back transaction after cancellation"),
                Err(e) => tracing::warn!("Failed to roll back cancelled transaction: {e:#}"),
            }
        }
    }

    pub async fn wait_if_paused(&self) {
        self.control.wait_if_paused().await
    }

    /// Release the transaction (rolling it back if still open) and the
    /// session. Cleanup errors are logged and swallowed.
    pub async fn close(&self) {
        if let Err(e) = self.rollback().await {
            tracing::warn!("Failed to release transaction: {e:#}");
        }
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            if let Err(e) = session.close().await {
                tracing::warn!("Failed to close graph session: {e:#}");
            }
        }
    }
}
