//! Relationship writer.

use super::WriterContext;
use anyhow::Result;
use graph_sink::GraphWrite;
use sync_core::{
    Direction, ErrorKind, RecordError, RelationshipMapping, RelationshipType, SyncKind,
    SyncReport, SyncStatus,
};
use vault_source::display_name;

/// Creates typed relationships from reference properties, with placeholder
/// nodes for targets that do not exist yet.
pub struct RelationshipWriter<'a> {
    ctx: WriterContext<'a>,
}

impl<'a> RelationshipWriter<'a> {
    pub fn new(ctx: WriterContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn run(
        &self,
        records: &[String],
        mappings: &[RelationshipMapping],
    ) -> Result<SyncReport> {
        let mut report = SyncReport::new(SyncKind::Relationship);
        for mapping in mappings {
            report.track(&mapping.property);
        }

        let total = records.len();
        for (index, record) in records.iter().enumerate() {
            if self.ctx.should_stop().await {
                return self.ctx.abort(SyncKind::Relationship).await;
            }
            self.ctx
                .progress(SyncStatus::CreatingRelationships, index + 1, total, record);

            if let Some(fields) = self.ctx.store.fields(record) {
                for mapping in mappings {
                    let Some(raw) = fields.get(&mapping.property).filter(|v| !v.is_null()) else {
                        continue;
                    };
                    for target in self.ctx.store.resolve_reference(raw, record) {
                        self.link(record, &target, mapping, &mut report).await;
                    }
                }
            }
            report.records_processed += 1;
        }

        tracing::info!(
            "Relationships: {} records, {} created, {} placeholders, {} errors",
            report.records_processed,
            report.total_success(),
            report.placeholders_created,
            report.total_errors()
        );
        Ok(report)
    }

    async fn link(
        &self,
        record: &str,
        target: &str,
        mapping: &RelationshipMapping,
        report: &mut SyncReport,
    ) {
        let property = mapping.property.as_str();
        let fail = |report: &mut SyncReport, error: RecordError| {
            tracing::debug!("{}", error.summary_line());
            report.record_error(property, error.for_property(property).for_target(target));
        };

        let rel_type = match RelationshipType::parse(&mapping.relationship_type) {
            Ok(rel_type) => rel_type,
            Err(e) => {
                fail(report, RecordError::with_kind(record, e.to_string(), ErrorKind::Validation));
                return;
            }
        };

        let existed = match self.ctx.infra.node_exists(target).await {
            Ok(existed) => existed,
            Err(e) => {
                fail(
                    report,
                    RecordError::with_kind(
                        record,
                        format!("Target node lookup failed for {target}: {e:#}"),
                        ErrorKind::TargetNodeFailure,
                    ),
                );
                return;
            }
        };
        let placeholder = GraphWrite::UpsertPlaceholder {
            id: target.to_string(),
            name: display_name(target),
        };
        if let Err(e) = self.ctx.infra.write(&placeholder).await {
            fail(
                report,
                RecordError::with_kind(
                    record,
                    format!("Failed to create target node {target}: {e:#}"),
                    ErrorKind::TargetNodeFailure,
                ),
            );
            return;
        }
        if !existed {
            report.placeholders_created += 1;
        }

        match self.ctx.infra.node_exists(record).await {
            Ok(true) => {}
            Ok(false) => {
                fail(
                    report,
                    RecordError::with_kind(
                        record,
                        format!("Source node not found: {record}"),
                        ErrorKind::SourceNodeMissing,
                    ),
                );
                return;
            }
            Err(e) => {
                fail(report, RecordError::classified(record, format!("{e:#}")));
                return;
            }
        }

        let (from, to) = match mapping.direction {
            Direction::Outgoing => (record, target),
            Direction::Incoming => (target, record),
        };
        let write = GraphWrite::UpsertRelationship {
            from: from.to_string(),
            to: to.to_string(),
            rel_type,
        };
        match self.ctx.infra.write(&write).await {
            Ok(()) => report.record_success(property),
            Err(e) => fail(report, RecordError::classified(record, format!("{e:#}"))),
        }
    }
}
