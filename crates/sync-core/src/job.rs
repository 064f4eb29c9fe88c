//! Sync job records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of work a queued job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SyncKind {
    #[serde(rename = "node-property-sync")]
    NodeProperty,
    #[serde(rename = "relationship-sync")]
    Relationship,
    #[serde(rename = "label-sync")]
    Label,
}

impl SyncKind {
    pub const ALL: [SyncKind; 3] = [SyncKind::NodeProperty, SyncKind::Relationship, SyncKind::Label];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::NodeProperty => "node-property-sync",
            SyncKind::Relationship => "relationship-sync",
            SyncKind::Label => "label-sync",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of queued sync work.
///
/// `target_set` names mapped properties (node-property and relationship jobs)
/// or label names (label jobs). A `full` job covers every enabled mapping of
/// its kind; its target set holds the names known when it was enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueueItem {
    pub id: String,
    pub kind: SyncKind,
    pub target_set: BTreeSet<String>,
    pub full: bool,
    pub enqueued_at: DateTime<Utc>,
}

impl SyncQueueItem {
    pub fn new(kind: SyncKind, target_set: BTreeSet<String>, full: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            target_set,
            full,
            enqueued_at: Utc::now(),
        }
    }

    pub fn partial<I, S>(kind: SyncKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(kind, names.into_iter().map(Into::into).collect(), false)
    }

    /// Union `names` into the target set. Returns how many names were new.
    pub fn merge_targets<'a, I>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        names
            .into_iter()
            .filter(|name| self.target_set.insert((*name).clone()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&SyncKind::NodeProperty).unwrap();
        assert_eq!(json, "\"node-property-sync\"");
        assert_eq!(SyncKind::Label.to_string(), "label-sync");
    }

    #[test]
    fn test_merge_targets_counts_new_names() {
        let mut item = SyncQueueItem::partial(SyncKind::Relationship, ["a", "b"]);
        let added = item.merge_targets(&["b".to_string(), "c".to_string()]);
        assert_eq!(added, 1);
        assert_eq!(item.target_set.len(), 3);
        assert!(!item.full);
    }
}
