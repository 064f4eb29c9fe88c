//! Per-record errors and aggregated writer reports.

use crate::errors::{classify, ErrorKind};
use crate::job::SyncKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of error lines shown to users.
pub const ERROR_SAMPLE_LIMIT: usize = 10;

/// One failed write, attributed to a record.
///
/// `property` is the mapped property (or label name for label jobs) the write
/// belonged to; `target_id` is only set for relationship writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    pub record_id: String,
    pub error: String,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

impl RecordError {
    /// Build an error whose kind is derived from the message.
    pub fn classified(record_id: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            record_id: record_id.into(),
            kind: classify(&error),
            error,
            property: None,
            target_id: None,
        }
    }

    /// Build an error with a known kind.
    pub fn with_kind(record_id: impl Into<String>, error: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            record_id: record_id.into(),
            error: error.into(),
            kind,
            property: None,
            target_id: None,
        }
    }

    pub fn for_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn for_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// Single-line rendering used in summaries.
    pub fn summary_line(&self) -> String {
        let mut line = format!("[{}] {}", self.kind, self.record_id);
        if let Some(property) = &self.property {
            line.push_str(&format!(" ({property}"));
            if let Some(target) = &self.target_id {
                line.push_str(&format!(" -> {target}"));
            }
            line.push(')');
        }
        line.push_str(&format!(": {}", self.error));
        line
    }
}

/// Counters for one mapped property or label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyStats {
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<RecordError>,
}

/// Outcome of one writer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub kind: SyncKind,
    pub records_processed: usize,
    pub stats: BTreeMap<String, PropertyStats>,
    /// Placeholder nodes that did not exist before this run.
    pub placeholders_created: usize,
    /// Record-level errors not attributable to a single property.
    pub record_errors: Vec<RecordError>,
    pub cancelled: bool,
}

impl SyncReport {
    pub fn new(kind: SyncKind) -> Self {
        Self {
            kind,
            records_processed: 0,
            stats: BTreeMap::new(),
            placeholders_created: 0,
            record_errors: Vec::new(),
            cancelled: false,
        }
    }

    /// A cancelled run. Counts gathered before cancellation were rolled back
    /// and are not reported.
    pub fn cancelled(kind: SyncKind) -> Self {
        Self {
            cancelled: true,
            ..Self::new(kind)
        }
    }

    /// Make sure `name` shows up in `stats` even if nothing was written for it.
    pub fn track(&mut self, name: &str) {
        self.stats.entry(name.to_string()).or_default();
    }

    pub fn record_success(&mut self, name: &str) {
        self.stats.entry(name.to_string()).or_default().success_count += 1;
    }

    pub fn record_error(&mut self, name: &str, error: RecordError) {
        let stats = self.stats.entry(name.to_string()).or_default();
        stats.error_count += 1;
        stats.errors.push(error);
    }

    pub fn total_success(&self) -> usize {
        self.stats.values().map(|s| s.success_count).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.stats.values().map(|s| s.error_count).sum::<usize>() + self.record_errors.len()
    }

    /// Every error in the report, record-level errors first.
    pub fn errors(&self) -> impl Iterator<Item = &RecordError> {
        self.record_errors
            .iter()
            .chain(self.stats.values().flat_map(|s| s.errors.iter()))
    }
}

/// Render at most `limit` error lines, followed by "...and N more" when the
/// list was truncated.
pub fn sample_errors<'a, I>(errors: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a RecordError>,
{
    let mut lines = Vec::new();
    let mut total = 0usize;
    for error in errors {
        if total < limit {
            lines.push(error.summary_line());
        }
        total += 1;
    }
    if total > limit {
        lines.push(format!("...and {} more", total - limit));
    }
    lines
}
