//! TOML settings file.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sync_core::{LabelName, LabelRule, MappingKind, MappingSet, RelationshipType};
use sync_engine::{BatchSize, SyncPlan};

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "vault-graph-sync.toml";

fn default_history_path() -> PathBuf {
    PathBuf::from(".vault-graph-sync/history.json")
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_username() -> String {
    "neo4j".to_string()
}

fn default_base_label() -> String {
    neo4j_sink::DEFAULT_BASE_LABEL.to_string()
}

/// Graph database connection. The password is not part of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub database: Option<String>,
    /// Label every synced node carries.
    #[serde(default = "default_base_label")]
    pub base_label: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            username: default_username(),
            database: None,
            base_label: default_base_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub vault_root: PathBuf,
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub batch_size: BatchSize,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default)]
    pub mappings: MappingSet,
    #[serde(default)]
    pub label_rules: Vec<LabelRule>,
}

impl Settings {
    /// Load and validate a settings file. Relative paths inside it are
    /// resolved against the file's directory.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let mut settings = Self::parse(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        if let Some(dir) = path.parent() {
            settings.resolve_relative_to(dir);
        }
        Ok(settings)
    }

    /// Parse and validate settings from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.vault_root.as_os_str().is_empty() {
            bail!("vault_root must not be empty");
        }
        if self.connection.uri.trim().is_empty() {
            bail!("connection.uri must not be empty");
        }
        LabelName::sanitize(&self.connection.base_label)
            .context("connection.base_label is not a usable label")?;

        for (property, mapping) in self.mappings.iter() {
            if property.trim().is_empty() {
                bail!("Mapping with an empty property name");
            }
            if !mapping.enabled {
                continue;
            }
            if let MappingKind::Relationship {
                relationship_type, ..
            } = &mapping.kind
            {
                RelationshipType::parse(relationship_type)
                    .with_context(|| format!("Invalid mapping for property '{property}'"))?;
            }
        }

        for (index, rule) in self.label_rules.iter().enumerate() {
            LabelName::sanitize(&rule.label_name)
                .with_context(|| format!("Invalid label rule #{}", index + 1))?;
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, dir: &Path) {
        if self.vault_root.is_relative() {
            self.vault_root = dir.join(&self.vault_root);
        }
        if self.history_path.is_relative() {
            self.history_path = dir.join(&self.history_path);
        }
    }

    /// What the writers work from.
    pub fn plan(&self) -> SyncPlan {
        SyncPlan {
            mappings: self.mappings.clone(),
            label_rules: self.label_rules.clone(),
            batch_size: self.batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{Direction, LabelRuleKind, SyncKind, TargetType};

    const SAMPLE: &str = r#"
vault_root = "notes"
batch_size = 200

[connection]
uri = "bolt://graph:7687"
database = "vault"

[mappings.priority]
mapping_type = "node_property"
target_type = "integer"

[mappings.related]
mapping_type = "relationship"
relationship_type = "RELATED_TO"
direction = "incoming"

[mappings.summary]
enabled = false
mapping_type = "none"

[[label_rules]]
kind = "tag"
pattern = "person"
label_name = "Person"

[[label_rules]]
kind = "path"
pattern = "projects"
label_name = "Project"
"#;

    #[test]
    fn test_parse_sample() {
        let settings = Settings::parse(SAMPLE).unwrap();
        assert_eq!(settings.vault_root, PathBuf::from("notes"));
        assert_eq!(settings.batch_size, BatchSize::Fixed(200));
        assert_eq!(settings.connection.uri, "bolt://graph:7687");
        assert_eq!(settings.connection.username, "neo4j");
        assert_eq!(settings.connection.database.as_deref(), Some("vault"));
        assert_eq!(settings.connection.base_label, "Note");
        assert_eq!(settings.history_path, default_history_path());

        let plan = settings.plan();
        let nodes = plan.mappings.node_properties(None);
        assert_eq!(nodes[0].target_property_name, "priority");
        assert_eq!(nodes[0].target_type, TargetType::Integer);
        let rels = plan.mappings.relationships(None);
        assert_eq!(rels[0].direction, Direction::Incoming);
        assert_eq!(plan.label_rules[1].kind, LabelRuleKind::Path);
        assert_eq!(plan.enabled_targets(SyncKind::Label).len(), 2);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::parse("vault_root = \"/vault\"").unwrap();
        assert_eq!(settings.batch_size, BatchSize::Auto);
        assert!(settings.mappings.is_empty());
        assert!(settings.label_rules.is_empty());
        assert_eq!(settings.connection, ConnectionSettings::default());
    }

    #[test]
    fn test_rejects_invalid_relationship_type() {
        let err = Settings::parse(
            r#"
vault_root = "/vault"
[mappings.related]
mapping_type = "relationship"
relationship_type = "related_to"
"#,
        )
        .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Invalid mapping for property 'related'"));
        assert!(message.contains("related_to"));
    }

    #[test]
    fn test_disabled_mappings_are_not_validated() {
        let settings = Settings::parse(
            r#"
vault_root = "/vault"
[mappings.related]
enabled = false
mapping_type = "relationship"
relationship_type = "not valid"
"#,
        )
        .unwrap();
        assert!(settings.plan().mappings.relationships(None).is_empty());
    }

    #[test]
    fn test_rejects_bad_batch_size_and_labels() {
        assert!(Settings::parse("vault_root = \"/v\"\nbatch_size = -5").is_err());
        assert!(Settings::parse(
            "vault_root = \"/v\"\n[[label_rules]]\nkind = \"tag\"\npattern = \"x\"\nlabel_name = \"  \"\n"
        )
        .is_err());
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        std::fs::write(&path, SAMPLE).unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.vault_root, dir.path().join("notes"));
        assert!(settings.history_path.starts_with(dir.path()));
    }
}
