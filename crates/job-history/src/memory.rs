use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::log::HistoryLog;
use crate::store::HistoryStore;

/// History kept in memory for the lifetime of the process.
#[derive(Default)]
pub struct MemoryHistoryStore {
    log: Mutex<HistoryLog>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self) -> Result<HistoryLog> {
        Ok(self.log.lock().await.clone())
    }

    async fn save(&self, log: &HistoryLog) -> Result<()> {
        *self.log.lock().await = log.clone();
        Ok(())
    }
}
