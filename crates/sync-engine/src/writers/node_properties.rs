//! Node property writer.

use super::WriterContext;
use anyhow::Result;
use graph_sink::GraphWrite;
use std::collections::BTreeMap;
use sync_core::{convert, NodePropertyMapping, RecordError, SyncKind, SyncReport, SyncStatus};
use vault_source::display_name;

/// Upserts one node per record carrying its converted mapped properties.
pub struct NodePropertyWriter<'a> {
    ctx: WriterContext<'a>,
}

impl<'a> NodePropertyWriter<'a> {
    pub fn new(ctx: WriterContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn run(
        &self,
        records: &[String],
        mappings: &[NodePropertyMapping],
    ) -> Result<SyncReport> {
        let mut report = SyncReport::new(SyncKind::NodeProperty);
        for mapping in mappings {
            report.track(&mapping.property);
        }

        let total = records.len();
        for (index, record) in records.iter().enumerate() {
            if self.ctx.should_stop().await {
                return self.ctx.abort(SyncKind::NodeProperty).await;
            }
            self.ctx
                .progress(SyncStatus::UpdatingProperties, index + 1, total, record);

            let mut properties = BTreeMap::new();
            let mut included: Vec<&str> = Vec::new();
            if let Some(fields) = self.ctx.store.fields(record) {
                for mapping in mappings {
                    let Some(raw) = fields.get(&mapping.property).filter(|v| !v.is_null()) else {
                        continue;
                    };
                    match convert(raw, mapping.target_type) {
                        Some(value) => {
                            properties.insert(mapping.target_property_name.clone(), value);
                            included.push(&mapping.property);
                        }
                        None => tracing::debug!(
                            "Skipping {}.{}: {} cannot be converted to {:?}",
                            record,
                            mapping.property,
                            raw,
                            mapping.target_type
                        ),
                    }
                }
            }

            let write = GraphWrite::UpsertNode {
                id: record.clone(),
                name: display_name(record),
                properties,
            };
            match self.ctx.infra.write(&write).await {
                Ok(()) => {
                    for property in &included {
                        report.record_success(property);
                    }
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    tracing::debug!("Node upsert failed for {record}: {message}");
                    if included.is_empty() {
                        report
                            .record_errors
                            .push(RecordError::classified(record, &message));
                    }
                    for property in &included {
                        report.record_error(
                            property,
                            RecordError::classified(record, &message).for_property(*property),
                        );
                    }
                }
            }
            report.records_processed += 1;
        }

        tracing::info!(
            "Node properties: {} records, {} property writes, {} errors",
            report.records_processed,
            report.total_success(),
            report.total_errors()
        );
        Ok(report)
    }
}
