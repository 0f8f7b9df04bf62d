//! The generic per-envelope pipeline shared by every resource type.

use std::collections::BTreeMap;

use pmsync_core::{
    DanglingReferenceWarning, PipelineStage, ResourceEnvelope, ResourceKind, ResourceTypeConfig,
    StoredRecord, SyncError, Value, TYPE_COLUMN,
};
use pmsync_storage::RecordStore;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, info_span, field, Instrument, Span};

use crate::envelope::{check_required_fields, unwrap_envelope};
use crate::json_fields::encode_json_fields;
use crate::relationships::resolve_relationships;
use crate::schema::validate_record;

/// A successful write and the warnings raised on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub kind: ResourceKind,
    pub resource_id: String,
    pub warnings: Vec<DanglingReferenceWarning>,
    pub record: StoredRecord,
}

/// Builds the pre-validation row: key column, `type`, declared attributes, then
/// the resolver's foreign-key columns.
///
/// Attributes that are not declared columns are dropped. Attributes named like a
/// relationship's local column are dropped too; the resolver owns those columns.
pub fn assemble_record(
    config: &ResourceTypeConfig,
    envelope: &ResourceEnvelope,
    resolved_columns: BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    let mut columns = BTreeMap::new();
    for (key, value) in &envelope.attributes {
        if key == &config.key_column || config.relationship_for_column(key).is_some() {
            continue;
        }
        if config.schema.contains(key) {
            columns.insert(key.clone(), value.clone());
        } else {
            debug!(
                kind = %config.kind,
                resource_id = envelope.id.as_str(),
                attribute = key.as_str(),
                "dropping undeclared attribute"
            );
        }
    }

    let resource_type = envelope
        .resource_type
        .clone()
        .unwrap_or_else(|| config.kind.api_type().to_string());
    columns.insert(TYPE_COLUMN.to_string(), Value::String(resource_type));
    columns.insert(config.key_column.clone(), Value::String(envelope.id.clone()));
    columns.extend(resolved_columns);
    columns
}

/// Runs one raw resource object through every stage and upserts it.
///
/// Nothing is written unless every gate passes. Storage is only touched for
/// relationship lookups and the final upsert.
pub async fn sync_resource<S>(
    store: &S,
    config: &ResourceTypeConfig,
    raw: &JsonValue,
) -> Result<SyncOutcome, SyncError>
where
    S: RecordStore + ?Sized,
{
    let span = info_span!("sync_resource", kind = %config.kind, resource_id = field::Empty);
    async move {
        let envelope = unwrap_envelope(raw)?;
        Span::current().record("resource_id", envelope.id.as_str());

        check_required_fields(&envelope, &config.required_fields)?;

        let resolved = resolve_relationships(store, &envelope, config).await?;
        let mut columns = assemble_record(config, &envelope, resolved.columns);

        encode_json_fields(&mut columns, &config.json_fields);

        let columns = validate_record(&envelope.id, columns, &config.schema)?;
        let record = StoredRecord {
            table: config.table().to_string(),
            key_column: config.key_column.clone(),
            columns,
            kinds: config.schema.kinds(),
        };

        if let Err(source) = store
            .upsert(config.table(), &config.key_column, &record)
            .await
        {
            error!(error = %source, "upsert failed");
            return Err(SyncError::Storage {
                resource_id: envelope.id,
                stage: PipelineStage::SchemaValidated,
                source,
            });
        }

        info!(warnings = resolved.warnings.len(), "resource written");
        Ok(SyncOutcome {
            kind: config.kind,
            resource_id: envelope.id,
            warnings: resolved.warnings,
            record,
        })
    }
    .instrument(span)
    .await
}
