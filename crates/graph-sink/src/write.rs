//! Store-agnostic write operations.

use std::collections::BTreeMap;
use sync_core::{LabelName, PropertyValue, RelationshipType};

/// One idempotent graph write.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphWrite {
    /// Create or update the node `id`, setting `name` and every property.
    UpsertNode {
        id: String,
        name: String,
        properties: BTreeMap<String, PropertyValue>,
    },
    /// Create the node `id` if missing. An existing node is left untouched.
    UpsertPlaceholder { id: String, name: String },
    /// Merge a `rel_type` relationship from `from` to `to`. Both nodes must
    /// already exist.
    UpsertRelationship {
        from: String,
        to: String,
        rel_type: RelationshipType,
    },
    /// Add `label` to the node `id`.
    SetLabel { id: String, label: LabelName },
}

impl GraphWrite {
    /// Identifier of the node the write is anchored on.
    pub fn node_id(&self) -> &str {
        match self {
            GraphWrite::UpsertNode { id, .. }
            | GraphWrite::UpsertPlaceholder { id, .. }
            | GraphWrite::SetLabel { id, .. } => id,
            GraphWrite::UpsertRelationship { from, .. } => from,
        }
    }
}
