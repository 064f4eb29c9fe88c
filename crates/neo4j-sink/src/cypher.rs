//! Cypher rendering for [`GraphWrite`] operations.
//!
//! Values always travel as bound parameters. Identifiers (the base label,
//! property keys, relationship types and labels) cannot be parameterized, so
//! they are backtick-quoted here; relationship types and labels have already
//! been validated or sanitized by their `sync-core` newtypes.

use graph_sink::GraphWrite;
use sync_core::PropertyValue;

/// A rendered statement with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<(String, PropertyValue)>,
}

impl Statement {
    fn new(text: String) -> Self {
        Self {
            text,
            params: Vec::new(),
        }
    }

    fn param(mut self, key: &str, value: PropertyValue) -> Self {
        self.params.push((key.to_string(), value));
        self
    }
}

/// Quote an identifier for embedding into Cypher.
pub fn escape_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Render a write against nodes carrying `base_label`, keyed by `path`.
pub fn render_write(write: &GraphWrite, base_label: &str) -> Statement {
    let label = escape_identifier(base_label);
    match write {
        GraphWrite::UpsertNode {
            id,
            name,
            properties,
        } => {
            let mut assignments = vec!["n.name = $name".to_string()];
            let mut params = Vec::with_capacity(properties.len());
            for (i, (key, value)) in properties.iter().enumerate() {
                let param = format!("p{i}");
                assignments.push(format!("n.{} = ${param}", escape_identifier(key)));
                params.push((param, value.clone()));
            }
            let mut statement = Statement::new(format!(
                "MERGE (n:{label} {{path: $path}}) SET {}",
                assignments.join(", ")
            ))
            .param("path", PropertyValue::String(id.clone()))
            .param("name", PropertyValue::String(name.clone()));
            statement.params.extend(params);
            statement
        }
        GraphWrite::UpsertPlaceholder { id, name } => Statement::new(format!(
            "MERGE (n:{label} {{path: $path}}) ON CREATE SET n.name = $name"
        ))
        .param("path", PropertyValue::String(id.clone()))
        .param("name", PropertyValue::String(name.clone())),
        GraphWrite::UpsertRelationship { from, to, rel_type } => Statement::new(format!(
            "MATCH (a:{label} {{path: $from}}) MATCH (b:{label} {{path: $to}}) MERGE (a)-[:{}]->(b)",
            escape_identifier(rel_type.as_str())
        ))
        .param("from", PropertyValue::String(from.clone()))
        .param("to", PropertyValue::String(to.clone())),
        GraphWrite::SetLabel { id, label: extra } => Statement::new(format!(
            "MATCH (n:{label} {{path: $path}}) SET n:{}",
            escape_identifier(extra.as_str())
        ))
        .param("path", PropertyValue::String(id.clone())),
    }
}

/// Statement counting nodes with the given path.
pub fn render_node_exists(id: &str, base_label: &str) -> Statement {
    Statement::new(format!(
        "MATCH (n:{} {{path: $path}}) RETURN count(n) AS count",
        escape_identifier(base_label)
    ))
    .param("path", PropertyValue::String(id.to_string()))
}

/// Statement returning the paths among `ids` that have a node.
pub fn render_existing_nodes(ids: &[String], base_label: &str) -> Statement {
    Statement::new(format!(
        "MATCH (n:{}) WHERE n.path IN $paths RETURN n.path AS path",
        escape_identifier(base_label)
    ))
    .param("paths", PropertyValue::StringList(ids.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use sync_core::{LabelName, RelationshipType};

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("Note"), "`Note`");
        assert_eq!(escape_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_render_upsert_node() {
        let write = GraphWrite::UpsertNode {
            id: "work/a.md".to_string(),
            name: "a".to_string(),
            properties: BTreeMap::from([
                ("due date".to_string(), PropertyValue::Date("2024-01-02".to_string())),
                ("rank".to_string(), PropertyValue::Integer(3)),
            ]),
        };
        let statement = render_write(&write, "Note");
        assert_eq!(
            statement.text,
            "MERGE (n:`Note` {path: $path}) SET n.name = $name, n.`due date` = $p0, n.`rank` = $p1"
        );
        assert_eq!(statement.params.len(), 4);
        assert_eq!(statement.params[3], ("p1".to_string(), PropertyValue::Integer(3)));
    }

    #[test]
    fn test_render_relationship() {
        let write = GraphWrite::UpsertRelationship {
            from: "a.md".to_string(),
            to: "b.md".to_string(),
            rel_type: RelationshipType::parse("RELATED_TO").unwrap(),
        };
        assert_eq!(
            render_write(&write, "Note").text,
            "MATCH (a:`Note` {path: $from}) MATCH (b:`Note` {path: $to}) MERGE (a)-[:`RELATED_TO`]->(b)"
        );
    }

    #[test]
    fn test_render_placeholder_and_label() {
        let placeholder = GraphWrite::UpsertPlaceholder {
            id: "c.md".to_string(),
            name: "c".to_string(),
        };
        assert_eq!(
            render_write(&placeholder, "Note").text,
            "MERGE (n:`Note` {path: $path}) ON CREATE SET n.name = $name"
        );

        let label = GraphWrite::SetLabel {
            id: "c.md".to_string(),
            label: LabelName::sanitize("Deep Work").unwrap(),
        };
        assert_eq!(
            render_write(&label, "Note").text,
            "MATCH (n:`Note` {path: $path}) SET n:`Deep_Work`"
        );
    }

    #[test]
    fn test_render_lookups() {
        let exists = render_node_exists("a.md", "Note");
        assert!(exists.text.ends_with("RETURN count(n) AS count"));
        let batch = render_existing_nodes(&["a.md".to_string()], "Note");
        assert_eq!(
            batch.params,
            vec![(
                "paths".to_string(),
                PropertyValue::StringList(vec!["a.md".to_string()])
            )]
        );
    }
}
