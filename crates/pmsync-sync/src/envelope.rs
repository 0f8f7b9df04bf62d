//! Envelope unwrapping and the required-field gate. Neither touches storage.

use std::collections::BTreeMap;

use pmsync_core::{RelationshipRef, ResourceEnvelope, SyncError, Value, TYPE_COLUMN};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

/// Splits a decoded JSON:API resource object into its envelope parts.
///
/// A root-level `type` is copied into the attributes only when the attributes do
/// not carry their own `type`.
pub fn unwrap_envelope(raw: &JsonValue) -> Result<ResourceEnvelope, SyncError> {
    let root = raw
        .as_object()
        .ok_or_else(|| SyncError::input_shape("resource document must be a JSON object"))?;

    let id = match root.get("id") {
        None => return Err(SyncError::missing_id()),
        Some(value) => id_text(value)
            .ok_or_else(|| SyncError::input_shape("`id` must be a non-empty string or number"))?,
    };
    let root_type = root
        .get("type")
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    let mut attributes: BTreeMap<String, Value> = match root.get("attributes") {
        None | Some(JsonValue::Null) => BTreeMap::new(),
        Some(JsonValue::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect(),
        Some(_) => return Err(SyncError::input_shape("`attributes` must be an object")),
    };
    if let Some(root_type) = &root_type {
        attributes
            .entry(TYPE_COLUMN.to_string())
            .or_insert_with(|| Value::String(root_type.clone()));
    }
    let resource_type = attributes
        .get(TYPE_COLUMN)
        .and_then(Value::as_str)
        .map(str::to_string)
        .or(root_type);

    let relationships = match root.get("relationships") {
        None | Some(JsonValue::Null) => BTreeMap::new(),
        Some(JsonValue::Object(map)) => relationship_refs(&id, map),
        Some(_) => return Err(SyncError::input_shape("`relationships` must be an object")),
    };

    Ok(ResourceEnvelope {
        id,
        resource_type,
        attributes,
        relationships,
    })
}

/// The envelope id without unwrapping the rest of the document.
pub fn peek_id(raw: &JsonValue) -> Option<String> {
    raw.get("id").and_then(id_text)
}

fn id_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn relationship_refs(
    resource_id: &str,
    map: &Map<String, JsonValue>,
) -> BTreeMap<String, RelationshipRef> {
    let mut refs = BTreeMap::new();
    for (api_key, entry) in map {
        match entry.get("data") {
            // Links-only or meta-only relationship objects carry no linkage.
            None => {}
            Some(JsonValue::Null) => {
                refs.insert(
                    api_key.clone(),
                    RelationshipRef {
                        api_key: api_key.clone(),
                        target_id: None,
                        target_type: None,
                    },
                );
            }
            Some(JsonValue::Object(linkage)) => {
                refs.insert(
                    api_key.clone(),
                    RelationshipRef {
                        api_key: api_key.clone(),
                        target_id: linkage.get("id").and_then(id_text),
                        target_type: linkage
                            .get("type")
                            .and_then(JsonValue::as_str)
                            .map(str::to_string),
                    },
                );
            }
            Some(JsonValue::Array(_)) => {
                debug!(resource_id, api_key = api_key.as_str(), "skipping to-many relationship");
            }
            Some(_) => {
                debug!(resource_id, api_key = api_key.as_str(), "skipping malformed relationship linkage");
            }
        }
    }
    refs
}

/// Fails with every listed key that is absent from the attributes.
///
/// Presence is what counts: a key holding `null` satisfies this gate and is left
/// to the schema validator.
pub fn check_required_fields(
    envelope: &ResourceEnvelope,
    required_fields: &[String],
) -> Result<(), SyncError> {
    let missing_keys: Vec<String> = required_fields
        .iter()
        .filter(|key| !envelope.attributes.contains_key(key.as_str()))
        .cloned()
        .collect();
    if missing_keys.is_empty() {
        Ok(())
    } else {
        Err(SyncError::MissingRequiredFields {
            resource_id: envelope.id.clone(),
            missing_keys,
        })
    }
}
