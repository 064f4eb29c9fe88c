//! History entry type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use sync_core::{sample_errors, SyncKind, SyncQueueItem, SyncReport, ERROR_SAMPLE_LIMIT};

/// Message recorded for cancelled jobs.
pub const CANCELLED_MESSAGE: &str = "cancelled";

/// Success and error counts for one mapped property or label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCounts {
    pub success_count: usize,
    pub error_count: usize,
}

/// One finished job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub kind: SyncKind,
    pub full: bool,
    pub targets: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub cancelled: bool,
    pub message: String,
    #[serde(default)]
    pub records_processed: usize,
    #[serde(default)]
    pub placeholders_created: usize,
    #[serde(default)]
    pub stats: BTreeMap<String, PropertyCounts>,
    /// First errors of the job, `[KIND]`-prefixed, plus an "...and N more"
    /// line when truncated.
    #[serde(default)]
    pub sampled_errors: Vec<String>,
    #[serde(default)]
    pub total_errors: usize,
}

impl HistoryEntry {
    fn base(item: &SyncQueueItem, started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            id: item.id.clone(),
            kind: item.kind,
            full: item.full,
            targets: item.target_set.iter().cloned().collect(),
            started_at,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            success: false,
            cancelled: false,
            message: String::new(),
            records_processed: 0,
            placeholders_created: 0,
            stats: BTreeMap::new(),
            sampled_errors: Vec::new(),
            total_errors: 0,
        }
    }

    /// Entry for a job whose writer ran to completion or was cancelled.
    pub fn from_report(
        item: &SyncQueueItem,
        started_at: DateTime<Utc>,
        duration: Duration,
        report: &SyncReport,
    ) -> Self {
        let mut entry = Self::base(item, started_at, duration);
        if report.cancelled {
            entry.cancelled = true;
            entry.message = CANCELLED_MESSAGE.to_string();
            return entry;
        }

        entry.success = true;
        entry.records_processed = report.records_processed;
        entry.placeholders_created = report.placeholders_created;
        entry.stats = report
            .stats
            .iter()
            .map(|(name, stats)| {
                (
                    name.clone(),
                    PropertyCounts {
                        success_count: stats.success_count,
                        error_count: stats.error_count,
                    },
                )
            })
            .collect();
        entry.total_errors = report.total_errors();
        entry.sampled_errors = sample_errors(report.errors(), ERROR_SAMPLE_LIMIT);
        entry.message = summary_message(report);
        entry
    }

    /// Entry for a job that aborted before or while talking to the graph.
    pub fn failed(
        item: &SyncQueueItem,
        started_at: DateTime<Utc>,
        duration: Duration,
        error: &anyhow::Error,
    ) -> Self {
        let mut entry = Self::base(item, started_at, duration);
        entry.message = format!("{error:#}");
        entry
    }
}

fn summary_message(report: &SyncReport) -> String {
    let mut message = format!(
        "{} records, {} writes succeeded, {} errors",
        report.records_processed,
        report.total_success(),
        report.total_errors()
    );
    if report.placeholders_created > 0 {
        message.push_str(&format!(
            ", {} placeholder nodes created",
            report.placeholders_created
        ));
    }
    message
}
