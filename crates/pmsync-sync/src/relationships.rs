//! Relationship resolution against already-stored owner rows.
//!
//! Every configured relationship yields one [`Resolution`]. A target that is not
//! stored yet is never fatal: its column is nulled and a warning is handed back
//! with the result. A reference to the envelope's own row always links, since
//! the upsert that follows creates it.

use std::collections::BTreeMap;

use pmsync_core::{
    DanglingReferenceWarning, PipelineStage, RelationshipConfig, RelationshipRef,
    ResourceEnvelope, ResourceTypeConfig, StoreError, SyncError, Value,
};
use pmsync_storage::RecordStore;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The owner row exists; the column takes the target id.
    Linked(String),
    /// The remote side sent an explicit empty linkage.
    Cleared,
    /// The owner row is missing; the column is nulled.
    Dangling(DanglingReferenceWarning),
}

impl Resolution {
    pub fn column_value(&self) -> Value {
        match self {
            Resolution::Linked(target_id) => Value::String(target_id.clone()),
            Resolution::Cleared | Resolution::Dangling(_) => Value::Null,
        }
    }
}

/// Local foreign-key columns plus the warnings raised while filling them.
///
/// Relationships the envelope does not mention are absent from `columns`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRelationships {
    pub columns: BTreeMap<String, Value>,
    pub warnings: Vec<DanglingReferenceWarning>,
}

pub async fn resolve_relationship<S>(
    store: &S,
    resource_id: &str,
    config: &RelationshipConfig,
    reference: &RelationshipRef,
) -> Result<Resolution, StoreError>
where
    S: RecordStore + ?Sized,
{
    let Some(target_id) = reference.target_id.as_deref() else {
        return Ok(Resolution::Cleared);
    };

    let table = config.owner.table();
    let lookup_column = config.lookup_column();
    if store.exists(table, lookup_column, target_id).await? {
        debug!(
            resource_id,
            api_key = config.api_key.as_str(),
            target_id,
            "relationship resolved"
        );
        return Ok(Resolution::Linked(target_id.to_string()));
    }

    warn!(
        resource_id,
        api_key = config.api_key.as_str(),
        target_id,
        owner = table,
        lookup_column,
        "dangling reference; storing null"
    );
    Ok(Resolution::Dangling(DanglingReferenceWarning {
        resource_id: resource_id.to_string(),
        api_key: config.api_key.clone(),
        target_id: target_id.to_string(),
    }))
}

/// True when the reference names the row this envelope is about to write.
fn is_self_reference(
    resource: &ResourceTypeConfig,
    envelope: &ResourceEnvelope,
    config: &RelationshipConfig,
    reference: &RelationshipRef,
) -> bool {
    config.owner == resource.kind
        && config.lookup_column() == resource.key_column
        && reference.target_id.as_deref() == Some(envelope.id.as_str())
}

/// Resolves every configured relationship the envelope carries, one point lookup each.
pub async fn resolve_relationships<S>(
    store: &S,
    envelope: &ResourceEnvelope,
    resource: &ResourceTypeConfig,
) -> Result<ResolvedRelationships, SyncError>
where
    S: RecordStore + ?Sized,
{
    let mut resolved = ResolvedRelationships::default();
    for config in &resource.relationships {
        let Some(reference) = envelope.relationships.get(&config.api_key) else {
            continue;
        };
        let resolution = if is_self_reference(resource, envelope, config, reference) {
            debug!(
                resource_id = envelope.id.as_str(),
                api_key = config.api_key.as_str(),
                "self reference linked"
            );
            Resolution::Linked(envelope.id.clone())
        } else {
            resolve_relationship(store, &envelope.id, config, reference)
                .await
                .map_err(|source| SyncError::Storage {
                    resource_id: envelope.id.clone(),
                    stage: PipelineStage::FieldsChecked,
                    source,
                })?
        };
        resolved
            .columns
            .insert(config.local_column.clone(), resolution.column_value());
        if let Resolution::Dangling(warning) = resolution {
            resolved.warnings.push(warning);
        }
    }
    Ok(resolved)
}
