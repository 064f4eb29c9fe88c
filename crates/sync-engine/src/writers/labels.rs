//! Label writer.

use super::WriterContext;
use crate::config::BatchSize;
use anyhow::Result;
use graph_sink::GraphWrite;
use std::collections::HashSet;
use sync_core::{
    classify, ErrorKind, LabelName, LabelRule, RecordError, SyncKind, SyncReport, SyncStatus,
};

/// Applies tag and path label rules to existing nodes.
pub struct LabelWriter<'a> {
    ctx: WriterContext<'a>,
    batch_size: BatchSize,
}

/// Labels one record should receive.
struct Application<'r> {
    position: usize,
    record: String,
    rules: Vec<&'r LabelRule>,
}

impl<'a> LabelWriter<'a> {
    pub fn new(ctx: WriterContext<'a>, batch_size: BatchSize) -> Self {
        Self { ctx, batch_size }
    }

    pub async fn run(&self, records: &[String], rules: &[LabelRule]) -> Result<SyncReport> {
        let mut report = SyncReport::new(SyncKind::Label);
        for rule in rules {
            report.track(&rule.label_name);
        }
        if rules.is_empty() {
            report.records_processed = records.len();
            return Ok(report);
        }

        let batch_size = self.batch_size.resolve(rules.len(), records.len());
        tracing::debug!(
            "Applying {} label rules to {} records in batches of {}",
            rules.len(),
            records.len(),
            batch_size
        );

        let total = records.len();
        for (batch_index, batch) in records.chunks(batch_size).enumerate() {
            if self.ctx.should_stop().await {
                return self.ctx.abort(SyncKind::Label).await;
            }

            let offset = batch_index * batch_size;
            let applications: Vec<Application<'_>> = batch
                .iter()
                .enumerate()
                .filter_map(|(i, record)| {
                    let facts = self.ctx.store.tags_and_path(record);
                    let mut seen = HashSet::new();
                    let matched: Vec<&LabelRule> = rules
                        .iter()
                        .filter(|rule| rule.matches(&facts.tags, &facts.path))
                        .filter(|&rule| seen.insert(rule.label_name.as_str()))
                        .collect();
                    (!matched.is_empty()).then(|| Application {
                        position: offset + i + 1,
                        record: record.clone(),
                        rules: matched,
                    })
                })
                .collect();
            report.records_processed += batch.len();
            if applications.is_empty() {
                continue;
            }

            let ids: Vec<String> = applications.iter().map(|a| a.record.clone()).collect();
            let existing = match self.ctx.infra.existing_nodes(&ids).await {
                Ok(existing) => existing,
                Err(e) => {
                    let message = format!("Node lookup failed for batch: {e:#}");
                    tracing::warn!("{message}");
                    let kind = classify(&message);
                    for application in &applications {
                        fail_all(&mut report, application, &message, kind);
                    }
                    continue;
                }
            };

            for application in &applications {
                if self.ctx.should_stop().await {
                    return self.ctx.abort(SyncKind::Label).await;
                }
                self.ctx.progress(
                    SyncStatus::ApplyingLabels,
                    application.position,
                    total,
                    &application.record,
                );

                if !existing.contains(&application.record) {
                    let message = format!("Source node not found: {}", application.record);
                    fail_all(&mut report, application, &message, ErrorKind::SourceNodeMissing);
                    continue;
                }

                match self.apply(application).await {
                    Ok(()) => {
                        for rule in &application.rules {
                            report.record_success(&rule.label_name);
                        }
                    }
                    Err((message, kind)) => fail_all(&mut report, application, &message, kind),
                }
            }
        }

        tracing::info!(
            "Labels: {} records, {} labels applied, {} errors",
            report.records_processed,
            report.total_success(),
            report.total_errors()
        );
        Ok(report)
    }

    /// Set every label of one record, stopping at the first failure.
    async fn apply(&self, application: &Application<'_>) -> Result<(), (String, ErrorKind)> {
        for rule in &application.rules {
            let label = LabelName::sanitize(&rule.label_name)
                .map_err(|e| (e.to_string(), ErrorKind::Validation))?;
            let write = GraphWrite::SetLabel {
                id: application.record.clone(),
                label,
            };
            if let Err(e) = self.ctx.infra.write(&write).await {
                let message = format!("{e:#}");
                let kind = classify(&message);
                return Err((message, kind));
            }
        }
        Ok(())
    }
}

fn fail_all(report: &mut SyncReport, application: &Application<'_>, message: &str, kind: ErrorKind) {
    tracing::debug!("Labels failed for {}: {message}", application.record);
    for rule in &application.rules {
        report.record_error(
            &rule.label_name,
            RecordError::with_kind(&application.record, message, kind).for_property(&rule.label_name),
        );
    }
}
