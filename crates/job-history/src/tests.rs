//! Unit tests for the job-history crate.

use chrono::Utc;
use std::time::Duration;
use sync_core::{ErrorKind, RecordError, SyncKind, SyncQueueItem, SyncReport};
use tempfile::TempDir;

use crate::{
    FilesystemHistoryStore, HistoryEntry, HistoryLog, HistoryStore, MemoryHistoryStore,
    CANCELLED_MESSAGE, MAX_HISTORY_ENTRIES,
};

fn sample_report() -> SyncReport {
    let mut report = SyncReport::new(SyncKind::NodeProperty);
    report.records_processed = 3;
    report.record_success("priority");
    report.record_success("priority");
    report.record_error(
        "priority",
        RecordError::with_kind("c.md", "write rejected", ErrorKind::QueryExecution)
            .for_property("priority"),
    );
    report
}

fn entry_with_message(message: &str) -> HistoryEntry {
    let item = SyncQueueItem::partial(SyncKind::Label, ["Person"]);
    let mut entry = HistoryEntry::from_report(
        &item,
        Utc::now(),
        Duration::from_millis(5),
        &SyncReport::new(SyncKind::Label),
    );
    entry.message = message.to_string();
    entry
}

// ============================================================================
// HistoryEntry Tests
// ============================================================================

#[test]
fn test_entry_from_report() {
    let item = SyncQueueItem::partial(SyncKind::NodeProperty, ["priority"]);
    let entry = HistoryEntry::from_report(
        &item,
        Utc::now(),
        Duration::from_millis(1500),
        &sample_report(),
    );

    assert!(entry.success);
    assert!(!entry.cancelled);
    assert_eq!(entry.id, item.id);
    assert_eq!(entry.targets, vec!["priority"]);
    assert_eq!(entry.duration_ms, 1500);
    assert_eq!(entry.stats["priority"].success_count, 2);
    assert_eq!(entry.stats["priority"].error_count, 1);
    assert_eq!(entry.total_errors, 1);
    assert_eq!(
        entry.sampled_errors,
        vec!["[QUERY_EXECUTION] c.md (priority): write rejected"]
    );
    assert_eq!(entry.message, "3 records, 2 writes succeeded, 1 errors");
}

#[test]
fn test_entry_for_cancelled_report() {
    let item = SyncQueueItem::partial(SyncKind::Relationship, ["related"]);
    let entry = HistoryEntry::from_report(
        &item,
        Utc::now(),
        Duration::from_millis(10),
        &SyncReport::cancelled(SyncKind::Relationship),
    );

    assert!(!entry.success);
    assert!(entry.cancelled);
    assert_eq!(entry.message, CANCELLED_MESSAGE);
    assert!(entry.stats.is_empty());
}

#[test]
fn test_failed_entry_keeps_context_chain() {
    let item = SyncQueueItem::new(SyncKind::Label, Default::default(), true);
    let error = anyhow::anyhow!("Connection refused").context("Failed to connect to Neo4j");
    let entry = HistoryEntry::failed(&item, Utc::now(), Duration::ZERO, &error);

    assert!(!entry.success);
    assert!(entry.full);
    assert_eq!(entry.message, "Failed to connect to Neo4j: Connection refused");
}

#[test]
fn test_entry_json_uses_camel_case() {
    let json = serde_json::to_value(entry_with_message("ok")).unwrap();
    assert!(json.get("durationMs").is_some());
    assert!(json.get("sampledErrors").is_some());
    assert_eq!(json["kind"], "label-sync");
}

// ============================================================================
// HistoryLog Tests
// ============================================================================

#[test]
fn test_log_is_newest_first_and_bounded() {
    let mut log = HistoryLog::new();
    for i in 0..(MAX_HISTORY_ENTRIES + 5) {
        log.push(entry_with_message(&format!("job {i}")));
    }

    assert_eq!(log.len(), MAX_HISTORY_ENTRIES);
    assert_eq!(
        log.latest().unwrap().message,
        format!("job {}", MAX_HISTORY_ENTRIES + 4)
    );
    assert_eq!(log.entries().last().unwrap().message, "job 5");
}

// ============================================================================
// Store Tests
// ============================================================================

#[tokio::test]
async fn test_filesystem_store_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemHistoryStore::new(dir.path().join("nested/history.json"));

    assert!(store.load().await.unwrap().is_empty());

    let mut log = HistoryLog::new();
    log.push(entry_with_message("first"));
    log.push(entry_with_message("second"));
    store.save(&log).await.unwrap();

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded, log);
    assert_eq!(loaded.latest().unwrap().message, "second");
}

#[tokio::test]
async fn test_filesystem_store_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "not json").unwrap();

    let store = FilesystemHistoryStore::new(&path);
    let err = store.load().await.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse history file"));
}

#[tokio::test]
async fn test_memory_store() {
    let store = MemoryHistoryStore::new();
    let mut log = HistoryLog::new();
    log.push(entry_with_message("only"));
    store.save(&log).await.unwrap();
    assert_eq!(store.load().await.unwrap().len(), 1);
}
