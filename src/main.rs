//! Command-line interface for vault-graph-sync
//!
//! # Usage Examples
//!
//! ## Full Sync
//! ```bash
//! # Node properties, relationships and labels for every enabled mapping
//! NEO4J_PASSWORD=secret vault-graph-sync sync
//!
//! # Use a settings file outside the working directory
//! vault-graph-sync --config ~/vault/vault-graph-sync.toml sync
//! ```
//!
//! ## Partial Sync
//! ```bash
//! # Only the listed mapped properties
//! vault-graph-sync sync-properties priority status
//! vault-graph-sync sync-relationships related
//!
//! # Only the listed labels (all label rules when none are given)
//! vault-graph-sync sync-labels Person
//! ```
//!
//! ## Inspection
//! ```bash
//! # Try a sync against an in-memory graph
//! vault-graph-sync --dry-run sync
//!
//! # Recent jobs, newest first
//! vault-graph-sync history
//!
//! # Check that Neo4j is reachable
//! vault-graph-sync check
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use job_history::{FilesystemHistoryStore, HistoryEntry, HistoryStore};
use std::path::PathBuf;
use sync_core::SyncKind;
use sync_engine::Channel;
use vault_graph_sync::{App, GraphOpts, Settings, DEFAULT_SETTINGS_FILE};

#[derive(Parser)]
#[command(name = "vault-graph-sync")]
#[command(about = "A tool for syncing markdown vault notes into a Neo4j graph")]
#[command(long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Graph database options
    #[command(flatten)]
    graph: GraphOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run node-property, relationship and label syncs for everything enabled
    Sync,

    /// Sync node properties
    SyncProperties {
        /// Mapped property names (all enabled node-property mappings when empty)
        names: Vec<String>,
    },

    /// Sync relationships
    SyncRelationships {
        /// Mapped property names (all enabled relationship mappings when empty)
        names: Vec<String>,
    },

    /// Apply label rules
    SyncLabels {
        /// Label names (all label rules when empty)
        labels: Vec<String>,
    },

    /// Show recent sync jobs
    History {
        /// Number of entries to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Check connectivity to the graph database
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_file(&cli.config)?;
    tracing::debug!("Loaded settings from {}", cli.config.display());

    let (kind, names) = match cli.command {
        Commands::History { limit } => return show_history(&settings, limit).await,
        Commands::Check => {
            let app = App::build(settings, &cli.graph).await?;
            app.check().await?;
            println!("Connected to {}", cli.graph.uri(&app.settings.connection));
            return Ok(());
        }
        Commands::Sync => (None, Vec::new()),
        Commands::SyncProperties { names } => (Some(SyncKind::NodeProperty), names),
        Commands::SyncRelationships { names } => (Some(SyncKind::Relationship), names),
        Commands::SyncLabels { labels } => (Some(SyncKind::Label), labels),
    };

    let app = App::build(settings, &cli.graph).await?;
    let _progress = app.hub.subscribe(Channel::Migration, |state| {
        if let Some(progress) = &state.migration.progress {
            tracing::debug!(
                "{} {}/{} {}",
                progress.status,
                progress.current,
                progress.total,
                progress.current_record.as_deref().unwrap_or("")
            );
        }
        Ok(())
    });

    let queued = match kind {
        Some(kind) => usize::from(app.enqueue(kind, names)),
        None => app.enqueue_all(),
    };
    if queued == 0 {
        println!("Nothing to sync: no enabled mappings or label rules match");
        return Ok(());
    }

    let entries = app.drain().await?;
    for entry in &entries {
        print_entry(entry);
    }

    if let Some(graph) = &app.memory_graph {
        let state = graph.snapshot();
        println!(
            "Dry run graph: {} nodes, {} relationships",
            state.nodes.len(),
            state.relationships.len()
        );
    }

    if entries.iter().any(|entry| !entry.success) {
        anyhow::bail!("{} of {} jobs did not succeed", failed_count(&entries), entries.len());
    }
    Ok(())
}

async fn show_history(settings: &Settings, limit: usize) -> anyhow::Result<()> {
    let store = FilesystemHistoryStore::new(settings.history_path.clone());
    let log = store
        .load()
        .await
        .context("Failed to load job history")?;
    if log.is_empty() {
        println!("No sync jobs recorded");
        return Ok(());
    }
    for entry in log.entries().iter().take(limit) {
        print_entry(entry);
    }
    Ok(())
}

fn failed_count(entries: &[HistoryEntry]) -> usize {
    entries.iter().filter(|entry| !entry.success).count()
}

fn print_entry(entry: &HistoryEntry) {
    let status = if entry.cancelled {
        "cancelled"
    } else if entry.success {
        "ok"
    } else {
        "failed"
    };
    println!(
        "[{}] {} {} ({}) {} in {}ms: {}",
        entry.started_at.format("%Y-%m-%d %H:%M:%S"),
        entry.kind,
        if entry.full { "full" } else { "partial" },
        entry.targets.join(", "),
        status,
        entry.duration_ms,
        entry.message
    );
    for error in &entry.sampled_errors {
        println!("    {error}");
    }
    if entry.total_errors > entry.sampled_errors.len() {
        println!(
            "    ... and {} more errors",
            entry.total_errors - entry.sampled_errors.len()
        );
    }
}
