//! Engine configuration: what to sync and how to batch it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use sync_core::{LabelRule, MappingSet, SyncCoreError, SyncKind};

const AUTO_BATCH_BUDGET: usize = 5000;
const AUTO_BATCH_MIN: usize = 50;
const AUTO_BATCH_MAX: usize = 1000;

/// Label writer batch size: an explicit positive count or `"auto"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BatchSizeRepr", into = "BatchSizeRepr")]
pub enum BatchSize {
    #[default]
    Auto,
    Fixed(usize),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BatchSizeRepr {
    Size(i64),
    Name(String),
}

impl TryFrom<BatchSizeRepr> for BatchSize {
    type Error = SyncCoreError;

    fn try_from(repr: BatchSizeRepr) -> Result<Self, Self::Error> {
        match repr {
            BatchSizeRepr::Size(n) if n > 0 => Ok(BatchSize::Fixed(n as usize)),
            BatchSizeRepr::Size(n) => Err(SyncCoreError::InvalidBatchSize(n.to_string())),
            BatchSizeRepr::Name(name) => name.parse(),
        }
    }
}

impl From<BatchSize> for BatchSizeRepr {
    fn from(size: BatchSize) -> Self {
        match size {
            BatchSize::Auto => BatchSizeRepr::Name("auto".to_string()),
            BatchSize::Fixed(n) => BatchSizeRepr::Size(n as i64),
        }
    }
}

impl FromStr for BatchSize {
    type Err = SyncCoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(BatchSize::Auto);
        }
        match trimmed.parse::<usize>() {
            Ok(n) if n > 0 => Ok(BatchSize::Fixed(n)),
            _ => Err(SyncCoreError::InvalidBatchSize(s.to_string())),
        }
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSize::Auto => write!(f, "auto"),
            BatchSize::Fixed(n) => write!(f, "{n}"),
        }
    }
}

impl BatchSize {
    /// Records per batch for `rule_count` label rules over `record_count`
    /// records. Never zero.
    pub fn resolve(&self, rule_count: usize, record_count: usize) -> usize {
        let size = match self {
            BatchSize::Auto => (AUTO_BATCH_BUDGET / rule_count.max(1))
                .clamp(AUTO_BATCH_MIN, AUTO_BATCH_MAX)
                .min(record_count),
            BatchSize::Fixed(n) => *n,
        };
        size.max(1)
    }
}

/// Mappings and rules the writers work from. Writers take a copy at job
/// start, so edits only affect later jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub mappings: MappingSet,
    pub label_rules: Vec<LabelRule>,
    pub batch_size: BatchSize,
}

impl SyncPlan {
    /// Names a full job of `kind` covers right now.
    pub fn enabled_targets(&self, kind: SyncKind) -> BTreeSet<String> {
        match kind {
            SyncKind::NodeProperty => self
                .mappings
                .node_properties(None)
                .into_iter()
                .map(|m| m.property)
                .collect(),
            SyncKind::Relationship => self
                .mappings
                .relationships(None)
                .into_iter()
                .map(|m| m.property)
                .collect(),
            SyncKind::Label => self
                .label_rules
                .iter()
                .map(|r| r.label_name.clone())
                .collect(),
        }
    }

    /// Label rules, optionally restricted to the given label names.
    pub fn label_rules(&self, filter: Option<&BTreeSet<String>>) -> Vec<LabelRule> {
        self.label_rules
            .iter()
            .filter(|r| filter.map_or(true, |names| names.contains(&r.label_name)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{Direction, MappingKind, PropertyMapping, TargetType};

    #[derive(Deserialize)]
    struct Wrapper {
        batch_size: BatchSize,
    }

    #[test]
    fn test_batch_size_parsing() {
        let auto: Wrapper = toml::from_str("batch_size = \"auto\"").unwrap();
        assert_eq!(auto.batch_size, BatchSize::Auto);
        let fixed: Wrapper = toml::from_str("batch_size = 250").unwrap();
        assert_eq!(fixed.batch_size, BatchSize::Fixed(250));
        assert!(toml::from_str::<Wrapper>("batch_size = 0").is_err());
        assert!(toml::from_str::<Wrapper>("batch_size = \"lots\"").is_err());
        assert_eq!("AUTO".parse::<BatchSize>().unwrap(), BatchSize::Auto);
    }

    #[test]
    fn test_auto_batch_size() {
        assert_eq!(BatchSize::Auto.resolve(1, 10_000), 1000);
        assert_eq!(BatchSize::Auto.resolve(0, 10_000), 1000);
        assert_eq!(BatchSize::Auto.resolve(20, 10_000), 250);
        assert_eq!(BatchSize::Auto.resolve(500, 10_000), 50);
        assert_eq!(BatchSize::Auto.resolve(1, 7), 7);
        assert_eq!(BatchSize::Auto.resolve(1, 0), 1);
        assert_eq!(BatchSize::Fixed(3).resolve(100, 2), 3);
    }

    #[test]
    fn test_enabled_targets() {
        let mut plan = SyncPlan::default();
        plan.mappings.set(
            "priority",
            PropertyMapping {
                enabled: true,
                kind: MappingKind::NodeProperty {
                    target_property_name: String::new(),
                    target_type: TargetType::Integer,
                },
            },
        );
        plan.mappings.set(
            "related",
            PropertyMapping {
                enabled: false,
                kind: MappingKind::Relationship {
                    relationship_type: "RELATED_TO".to_string(),
                    direction: Direction::Outgoing,
                },
            },
        );
        plan.label_rules.push(LabelRule::tag("person", "Person"));

        assert_eq!(
            plan.enabled_targets(SyncKind::NodeProperty),
            BTreeSet::from(["priority".to_string()])
        );
        assert!(plan.enabled_targets(SyncKind::Relationship).is_empty());
        assert_eq!(plan.label_rules(Some(&BTreeSet::new())).len(), 0);
        assert_eq!(plan.label_rules(None).len(), 1);
    }
}
