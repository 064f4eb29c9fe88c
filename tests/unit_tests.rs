use graph_sink::MemoryRelationship;
use sync_core::{PropertyValue, SyncKind};
use tempfile::TempDir;
use vault_graph_sync::{App, ConnectionSettings, GraphOpts, Settings};

fn opts(password: Option<&str>, dry_run: bool) -> GraphOpts {
    GraphOpts {
        neo4j_uri: None,
        neo4j_password: password.map(str::to_string),
        dry_run,
    }
}

#[test]
fn test_graph_opts_credentials() {
    let connection = ConnectionSettings {
        database: Some("vault".to_string()),
        ..ConnectionSettings::default()
    };
    let credentials = opts(Some("secret"), false)
        .credentials(&connection)
        .unwrap();

    assert_eq!(credentials.username, "neo4j");
    assert_eq!(credentials.password, "secret");
    assert_eq!(credentials.database.as_deref(), Some("vault"));
}

#[test]
fn test_missing_password_requires_dry_run() {
    let connection = ConnectionSettings::default();
    let err = opts(None, false).credentials(&connection).unwrap_err();
    assert!(err.to_string().contains("NEO4J_PASSWORD"));

    let credentials = opts(None, true).credentials(&connection).unwrap();
    assert!(credentials.password.is_empty());
}

#[test]
fn test_uri_flag_overrides_settings() {
    let connection = ConnectionSettings::default();
    assert_eq!(opts(None, true).uri(&connection), "bolt://localhost:7687");

    let opts = GraphOpts {
        neo4j_uri: Some("bolt://graph:7687".to_string()),
        ..opts(None, true)
    };
    assert_eq!(opts.uri(&connection), "bolt://graph:7687");
}

#[test]
fn test_debug_redacts_password() {
    let rendered = format!("{:?}", opts(Some("secret"), false));
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("<redacted>"));
}

fn write_vault(dir: &TempDir) -> anyhow::Result<()> {
    let root = dir.path().join("vault");
    std::fs::create_dir_all(root.join("projects"))?;
    std::fs::write(
        root.join("alice.md"),
        "---\npriority: \"3\"\nrelated: \"[[bob]]\"\ntags: [person]\n---\nAlice\n",
    )?;
    std::fs::write(root.join("bob.md"), "Bob #person\n")?;
    std::fs::write(
        root.join("projects/graph.md"),
        "---\nrelated: [\"[[alice]]\", \"[[Nowhere]]\"]\n---\n",
    )?;
    std::fs::write(
        dir.path().join("vault-graph-sync.toml"),
        r#"
vault_root = "vault"

[mappings.priority]
mapping_type = "node_property"
target_type = "integer"

[mappings.related]
mapping_type = "relationship"
relationship_type = "RELATED_TO"

[[label_rules]]
kind = "tag"
pattern = "person"
label_name = "Person"

[[label_rules]]
kind = "path"
pattern = "projects"
label_name = "Project"
"#,
    )?;
    Ok(())
}

#[tokio::test]
async fn test_dry_run_full_sync() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_vault(&dir)?;
    let settings = Settings::from_file(&dir.path().join("vault-graph-sync.toml"))?;

    let app = App::build(settings, &opts(None, true)).await?;
    assert_eq!(app.enqueue_all(), 3);
    let entries = app.drain().await?;

    let kinds: Vec<SyncKind> = entries.iter().map(|entry| entry.kind).collect();
    assert_eq!(
        kinds,
        vec![SyncKind::NodeProperty, SyncKind::Relationship, SyncKind::Label]
    );
    assert!(entries.iter().all(|entry| entry.success));

    let graph = app.memory_graph.as_ref().unwrap();
    let alice = graph.node("alice.md").unwrap();
    assert_eq!(
        alice.properties.get("priority"),
        Some(&PropertyValue::Integer(3))
    );
    assert!(alice.labels.contains("Person"));
    assert!(graph.node("bob.md").unwrap().labels.contains("Person"));
    assert!(graph
        .node("projects/graph.md")
        .unwrap()
        .labels
        .contains("Project"));

    // The unresolved link becomes a placeholder node.
    assert!(graph.node("Nowhere.md").is_some());
    assert_eq!(entries[1].placeholders_created, 1);

    let relationships = graph.relationships();
    assert!(relationships.contains(&MemoryRelationship {
        from: "alice.md".to_string(),
        rel_type: "RELATED_TO".to_string(),
        to: "bob.md".to_string(),
    }));
    assert!(relationships.contains(&MemoryRelationship {
        from: "projects/graph.md".to_string(),
        rel_type: "RELATED_TO".to_string(),
        to: "alice.md".to_string(),
    }));
    assert_eq!(relationships.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_partial_sync() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_vault(&dir)?;
    let settings = Settings::from_file(&dir.path().join("vault-graph-sync.toml"))?;

    let app = App::build(settings, &opts(None, true)).await?;
    assert!(app.enqueue(SyncKind::Label, vec!["Project".to_string()]));
    let entries = app.drain().await?;

    assert_eq!(entries.len(), 1);
    assert!(!entries[0].full);
    assert_eq!(entries[0].targets, vec!["Project".to_string()]);

    // Labels only land on nodes that exist, and nothing created them.
    let graph = app.memory_graph.as_ref().unwrap();
    assert!(graph.node("projects/graph.md").is_none());
    assert_eq!(entries[0].total_errors, 1);
    Ok(())
}

#[tokio::test]
async fn test_nothing_enabled_queues_nothing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    std::fs::create_dir_all(dir.path().join("vault"))?;
    let settings = Settings::parse(&format!(
        "vault_root = \"{}\"",
        dir.path().join("vault").display()
    ))?;

    let app = App::build(settings, &opts(None, true)).await?;
    assert_eq!(app.enqueue_all(), 0);
    assert!(!app.enqueue(SyncKind::NodeProperty, Vec::new()));
    Ok(())
}
