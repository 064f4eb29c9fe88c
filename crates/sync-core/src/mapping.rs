//! Property mappings and label rules.
//!
//! A [`MappingSet`] is keyed by source property name, so a property can never
//! carry more than one mapping. Writers never read the set directly: they take
//! owned snapshots ([`NodePropertyMapping`], [`RelationshipMapping`]) at job
//! start.
//!
//! # TOML Format
//!
//! ```toml
//! [mappings.related]
//! enabled = true
//! mapping_type = "relationship"
//! relationship_type = "RELATED_TO"
//! direction = "outgoing"
//!
//! [mappings.priority]
//! enabled = true
//! mapping_type = "node_property"
//! target_property_name = "priority"
//! target_type = "integer"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Declared type of a node property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Boolean,
    Integer,
    Float,
    Date,
    Datetime,
    String,
    ListString,
}

/// Relationship direction relative to the record holding the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// record → target
    #[default]
    Outgoing,
    /// target → record
    Incoming,
}

/// Mapping-specific configuration, keyed by `mapping_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mapping_type", rename_all = "snake_case")]
pub enum MappingKind {
    None,
    Relationship {
        relationship_type: String,
        #[serde(default)]
        direction: Direction,
    },
    NodeProperty {
        #[serde(default)]
        target_property_name: String,
        target_type: TargetType,
    },
}

/// Configuration of a single source property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: MappingKind,
}

fn default_enabled() -> bool {
    true
}

/// Snapshot of an enabled node-property mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePropertyMapping {
    pub property: String,
    pub target_property_name: String,
    pub target_type: TargetType,
}

/// Snapshot of an enabled relationship mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipMapping {
    pub property: String,
    pub relationship_type: String,
    pub direction: Direction,
}

/// All property mappings, keyed by source property name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingSet {
    mappings: BTreeMap<String, PropertyMapping>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the mapping of `property`.
    pub fn set(&mut self, property: impl Into<String>, mapping: PropertyMapping) {
        self.mappings.insert(property.into(), mapping);
    }

    pub fn get(&self, property: &str) -> Option<&PropertyMapping> {
        self.mappings.get(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyMapping)> {
        self.mappings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Enabled node-property mappings, restricted to `filter` when given.
    pub fn node_properties(&self, filter: Option<&BTreeSet<String>>) -> Vec<NodePropertyMapping> {
        self.mappings
            .iter()
            .filter(|(name, m)| m.enabled && filter.map_or(true, |f| f.contains(*name)))
            .filter_map(|(name, m)| match &m.kind {
                MappingKind::NodeProperty {
                    target_property_name,
                    target_type,
                } => Some(NodePropertyMapping {
                    property: name.clone(),
                    target_property_name: if target_property_name.trim().is_empty() {
                        name.clone()
                    } else {
                        target_property_name.clone()
                    },
                    target_type: *target_type,
                }),
                _ => None,
            })
            .collect()
    }

    /// Enabled relationship mappings, restricted to `filter` when given.
    pub fn relationships(&self, filter: Option<&BTreeSet<String>>) -> Vec<RelationshipMapping> {
        self.mappings
            .iter()
            .filter(|(name, m)| m.enabled && filter.map_or(true, |f| f.contains(*name)))
            .filter_map(|(name, m)| match &m.kind {
                MappingKind::Relationship {
                    relationship_type,
                    direction,
                } => Some(RelationshipMapping {
                    property: name.clone(),
                    relationship_type: relationship_type.clone(),
                    direction: *direction,
                }),
                _ => None,
            })
            .collect()
    }
}

/// What a label rule matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelRuleKind {
    Tag,
    Path,
}

/// Attach `label_name` to every record matching `pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub kind: LabelRuleKind,
    #[serde(default)]
    pub pattern: String,
    pub label_name: String,
}

impl LabelRule {
    pub fn tag(pattern: impl Into<String>, label_name: impl Into<String>) -> Self {
        Self {
            kind: LabelRuleKind::Tag,
            pattern: pattern.into(),
            label_name: label_name.into(),
        }
    }

    pub fn path(pattern: impl Into<String>, label_name: impl Into<String>) -> Self {
        Self {
            kind: LabelRuleKind::Path,
            pattern: pattern.into(),
            label_name: label_name.into(),
        }
    }

    /// Test the rule against a record's precomputed tags (without `#`) and
    /// its vault-relative path.
    pub fn matches(&self, tags: &HashSet<String>, path: &str) -> bool {
        match self.kind {
            LabelRuleKind::Tag => {
                let tag = self.pattern.trim().trim_start_matches('#');
                !tag.is_empty() && tags.contains(tag)
            }
            LabelRuleKind::Path => {
                let folder = self.pattern.trim().trim_matches('/');
                if folder.is_empty() {
                    !path.contains('/')
                } else {
                    path.starts_with(&format!("{folder}/"))
                }
            }
        }
    }
}
