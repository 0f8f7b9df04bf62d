use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{FieldKind, PipelineStage, Value};

/// Failure reported by a storage backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("record for `{table}` has no value for key column `{key}`")]
    MissingKey { table: String, key: String },
    #[error("could not decode stored row: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn backend(err: impl fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn decode(err: impl fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// One column that failed its declared kind or nullability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub column: String,
    pub expected_kind: FieldKind,
    pub nullable: bool,
    pub actual_value: Value,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nullability = if self.nullable { "nullable " } else { "" };
        write!(f, "`{}` expected {nullability}{}, got ", self.column, self.expected_kind)?;
        match &self.actual_value {
            Value::Null => f.write_str("null"),
            other => write!(f, "{} {}", other.type_name(), other),
        }
    }
}

/// Fatal outcome for a single envelope. None of these leave a partial write behind.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("malformed resource envelope: {reason}")]
    InputShape { reason: String },
    #[error("resource {resource_id} is missing required fields: {}", .missing_keys.join(", "))]
    MissingRequiredFields {
        resource_id: String,
        missing_keys: Vec<String>,
    },
    #[error("resource {resource_id} failed schema validation: {}", join_violations(.violations))]
    SchemaValidation {
        resource_id: String,
        violations: Vec<SchemaViolation>,
    },
    #[error("storage failed for resource {resource_id} after stage {stage}: {source}")]
    Storage {
        resource_id: String,
        stage: PipelineStage,
        #[source]
        source: StoreError,
    },
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SyncError {
    pub fn missing_id() -> Self {
        Self::InputShape {
            reason: "no `id` at the document root".to_string(),
        }
    }

    pub fn input_shape(reason: impl Into<String>) -> Self {
        Self::InputShape {
            reason: reason.into(),
        }
    }

    pub fn resource_id(&self) -> Option<&str> {
        match self {
            SyncError::InputShape { .. } => None,
            SyncError::MissingRequiredFields { resource_id, .. }
            | SyncError::SchemaValidation { resource_id, .. }
            | SyncError::Storage { resource_id, .. } => Some(resource_id),
        }
    }

    /// The last stage the envelope reached before this error stopped it.
    pub fn stage(&self) -> PipelineStage {
        match self {
            SyncError::InputShape { .. } => PipelineStage::Received,
            SyncError::MissingRequiredFields { .. } => PipelineStage::Unwrapped,
            SyncError::SchemaValidation { .. } => PipelineStage::JsonEncoded,
            SyncError::Storage { stage, .. } => *stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_violation() {
        let err = SyncError::SchemaValidation {
            resource_id: "42".into(),
            violations: vec![
                SchemaViolation {
                    column: "budget".into(),
                    expected_kind: FieldKind::Numeric,
                    nullable: true,
                    actual_value: Value::from("lots"),
                },
                SchemaViolation {
                    column: "name".into(),
                    expected_kind: FieldKind::String,
                    nullable: false,
                    actual_value: Value::Null,
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("`budget` expected nullable numeric, got string \"lots\""));
        assert!(message.contains("`name` expected string, got null"));
        assert_eq!(err.resource_id(), Some("42"));
    }
}
