//! In-memory document store.

use crate::error::VaultError;
use crate::links;
use crate::{DocumentStore, Fields, TagsAndPath};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default)]
struct MemoryRecord {
    fields: Option<Fields>,
    tags: HashSet<String>,
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    records: BTreeMap<String, MemoryRecord>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. `fields` must be a JSON object to count as front matter;
    /// any other value leaves the record without fields.
    pub fn with_record<I, S>(mut self, id: impl Into<String>, fields: Value, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(id, fields, tags);
        self
    }

    pub fn insert<I, S>(&mut self, id: impl Into<String>, fields: Value, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = match fields {
            Value::Object(map) => Some(map),
            _ => None,
        };
        let tags = tags
            .into_iter()
            .map(|t| t.into().trim_start_matches('#').to_string())
            .collect();
        self.records.insert(id.into(), MemoryRecord { fields, tags });
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.records.remove(id).is_some()
    }
}

impl DocumentStore for MemoryVault {
    fn list_records(&self) -> Result<Vec<String>, VaultError> {
        Ok(self.records.keys().cloned().collect())
    }

    fn fields(&self, record_id: &str) -> Option<Fields> {
        self.records.get(record_id).and_then(|r| r.fields.clone())
    }

    fn resolve_reference(&self, value: &Value, _from: &str) -> Vec<String> {
        let known: Vec<String> = self.records.keys().cloned().collect();
        links::resolve_reference(value, &known)
    }

    fn tags_and_path(&self, record_id: &str) -> TagsAndPath {
        TagsAndPath {
            tags: self
                .records
                .get(record_id)
                .map(|r| r.tags.clone())
                .unwrap_or_default(),
            path: record_id.to_string(),
        }
    }
}
