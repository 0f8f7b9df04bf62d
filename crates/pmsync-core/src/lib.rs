//! Core domain model for the project-management mirror: envelopes, per-type
//! configuration, stored records and the error taxonomy shared by every crate.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

mod error;
mod value;

pub use error::{SchemaViolation, StoreError, SyncError};
pub use value::Value;

pub const CRATE_NAME: &str = "pmsync-core";

/// Column that receives the envelope id unless a resource type opts into a natural key.
pub const DEFAULT_KEY_COLUMN: &str = "id";
/// Discriminator column written for every resource type.
pub const TYPE_COLUMN: &str = "type";

macro_rules! resource_kinds {
    ($($variant:ident => $api:literal),+ $(,)?) => {
        /// Every resource type mirrored from the remote service.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum ResourceKind {
            $($variant),+
        }

        impl ResourceKind {
            pub const ALL: &'static [ResourceKind] = &[$(ResourceKind::$variant),+];

            /// JSON:API `type` string; also the local table name.
            pub fn api_type(self) -> &'static str {
                match self {
                    $(ResourceKind::$variant => $api),+
                }
            }

            pub fn from_api_type(value: &str) -> Option<Self> {
                match value {
                    $($api => Some(ResourceKind::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

resource_kinds! {
    Attachments => "attachments",
    Boards => "boards",
    Bookings => "bookings",
    Comments => "comments",
    Companies => "companies",
    ContactEntries => "contact_entries",
    CustomFieldOptions => "custom_field_options",
    CustomFields => "custom_fields",
    DealStatuses => "deal_statuses",
    Deals => "deals",
    DocumentTypes => "document_types",
    Entitlements => "entitlements",
    Events => "events",
    Expenses => "expenses",
    HolidayCalendars => "holiday_calendars",
    Holidays => "holidays",
    Invoices => "invoices",
    LineItems => "line_items",
    LostReasons => "lost_reasons",
    Payments => "payments",
    People => "people",
    Pipelines => "pipelines",
    Prices => "prices",
    Projects => "projects",
    PurchaseOrders => "purchase_orders",
    RateCards => "rate_cards",
    Sections => "sections",
    ServiceTypes => "service_types",
    Services => "services",
    Subsidiaries => "subsidiaries",
    TaskLists => "task_lists",
    Tasks => "tasks",
    TaxRates => "tax_rates",
    TimeEntries => "time_entries",
    Timers => "timers",
    WorkflowStatuses => "workflow_statuses",
    Workflows => "workflows",
}

impl ResourceKind {
    pub fn table(self) -> &'static str {
        self.api_type()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.api_type())
    }
}

/// Storage type of a column, checked by the schema validator before any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Numeric,
    Date,
    Timestamp,
    Boolean,
    Json,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Numeric => "numeric",
            FieldKind::Date => "date",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Boolean => "boolean",
            FieldKind::Json => "json",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

/// Column name -> declared kind and nullability.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    columns: BTreeMap<String, FieldSpec>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, kind: FieldKind, nullable: bool) {
        self.columns
            .insert(column.into(), FieldSpec { kind, nullable });
    }

    pub fn remove(&mut self, column: &str) -> Option<FieldSpec> {
        self.columns.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&FieldSpec> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn kinds(&self) -> BTreeMap<String, FieldKind> {
        self.columns
            .iter()
            .map(|(column, spec)| (column.clone(), spec.kind))
            .collect()
    }
}

/// A named single-valued pointer from one resource to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRef {
    pub api_key: String,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
}

/// The decoded id/type/attributes/relationships unit for one remote resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub attributes: BTreeMap<String, Value>,
    pub relationships: BTreeMap<String, RelationshipRef>,
}

/// How one relationship key of a resource type maps onto a local foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    pub api_key: String,
    pub local_column: String,
    pub owner: ResourceKind,
    /// Column on the owner's table matched against the target id. Absent means `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_column: Option<String>,
}

impl RelationshipConfig {
    pub fn lookup_column(&self) -> &str {
        self.lookup_column.as_deref().unwrap_or(DEFAULT_KEY_COLUMN)
    }
}

fn default_key_column() -> String {
    DEFAULT_KEY_COLUMN.to_string()
}

/// Static per-resource-type parameters for the normalization pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTypeConfig {
    pub kind: ResourceKind,
    #[serde(default = "default_key_column")]
    pub key_column: String,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
    #[serde(default)]
    pub json_fields: Vec<String>,
    pub schema: FieldSchema,
}

impl ResourceTypeConfig {
    /// Starts a config keyed by `id` with the key and `type` columns already declared.
    pub fn new(kind: ResourceKind) -> Self {
        let mut schema = FieldSchema::new();
        schema.insert(DEFAULT_KEY_COLUMN, FieldKind::String, false);
        schema.insert(TYPE_COLUMN, FieldKind::String, false);
        Self {
            kind,
            key_column: default_key_column(),
            required_fields: Vec::new(),
            relationships: Vec::new(),
            json_fields: Vec::new(),
            schema,
        }
    }

    pub fn table(&self) -> &'static str {
        self.kind.table()
    }

    /// Stores the envelope id under a natural key column instead of `id`.
    pub fn keyed_by(mut self, column: &str) -> Self {
        self.schema.remove(&self.key_column);
        self.key_column = column.to_string();
        self.schema.insert(column, FieldKind::String, false);
        self
    }

    pub fn required(mut self, fields: &[&str]) -> Self {
        self.required_fields
            .extend(fields.iter().map(|f| f.to_string()));
        self
    }

    /// Nullable column.
    pub fn col(mut self, column: &str, kind: FieldKind) -> Self {
        self.schema.insert(column, kind, true);
        self
    }

    /// Non-nullable column.
    pub fn col_not_null(mut self, column: &str, kind: FieldKind) -> Self {
        self.schema.insert(column, kind, false);
        self
    }

    /// Nullable JSON column that the encoder serializes before validation.
    pub fn json(mut self, column: &str) -> Self {
        self.schema.insert(column, FieldKind::Json, true);
        self.json_fields.push(column.to_string());
        self
    }

    pub fn belongs_to(self, api_key: &str, local_column: &str, owner: ResourceKind) -> Self {
        self.relationship(api_key, local_column, owner, None, true)
    }

    /// The column must end up non-null, which the schema gate enforces after resolution.
    pub fn belongs_to_not_null(
        self,
        api_key: &str,
        local_column: &str,
        owner: ResourceKind,
    ) -> Self {
        self.relationship(api_key, local_column, owner, None, false)
    }

    /// Looks the target up by `lookup_column` on the owner's table instead of `id`.
    pub fn belongs_to_via(
        self,
        api_key: &str,
        local_column: &str,
        owner: ResourceKind,
        lookup_column: &str,
    ) -> Self {
        self.relationship(
            api_key,
            local_column,
            owner,
            Some(lookup_column.to_string()),
            true,
        )
    }

    fn relationship(
        mut self,
        api_key: &str,
        local_column: &str,
        owner: ResourceKind,
        lookup_column: Option<String>,
        nullable: bool,
    ) -> Self {
        self.schema.insert(local_column, FieldKind::String, nullable);
        self.relationships.push(RelationshipConfig {
            api_key: api_key.to_string(),
            local_column: local_column.to_string(),
            owner,
            lookup_column,
        });
        self
    }

    pub fn relationship_for_column(&self, column: &str) -> Option<&RelationshipConfig> {
        self.relationships
            .iter()
            .find(|rel| rel.local_column == column)
    }
}

/// A stored row as returned by storage lookups.
pub type Row = BTreeMap<String, Value>;

/// The fully assembled, validated row handed to the upsert primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub table: String,
    pub key_column: String,
    pub columns: BTreeMap<String, Value>,
    /// Declared kind per column, used by backends that bind typed parameters.
    pub kinds: BTreeMap<String, FieldKind>,
}

impl StoredRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn key_value(&self) -> Option<String> {
        self.columns
            .get(&self.key_column)
            .and_then(Value::to_sql_text)
    }

    pub fn kind_of(&self, column: &str) -> FieldKind {
        self.kinds
            .get(column)
            .copied()
            .unwrap_or(FieldKind::String)
    }
}

/// Non-fatal: a relationship target was not found locally and its column was nulled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingReferenceWarning {
    pub resource_id: String,
    pub api_key: String,
    pub target_id: String,
}

impl fmt::Display for DanglingReferenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resource {} references missing {} {}",
            self.resource_id, self.api_key, self.target_id
        )
    }
}

/// Per-envelope state machine. Terminal on `Written` or on the first failed gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Unwrapped,
    FieldsChecked,
    RelationshipsResolved,
    JsonEncoded,
    SchemaValidated,
    Written,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Unwrapped => "unwrapped",
            PipelineStage::FieldsChecked => "fields_checked",
            PipelineStage::RelationshipsResolved => "relationships_resolved",
            PipelineStage::JsonEncoded => "json_encoded",
            PipelineStage::SchemaValidated => "schema_validated",
            PipelineStage::Written => "written",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_types_round_trip_for_every_kind() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_api_type(kind.api_type()), Some(*kind));
        }
        assert_eq!(ResourceKind::from_api_type("widgets"), None);
    }

    #[test]
    fn keyed_by_replaces_the_id_column() {
        let config = ResourceTypeConfig::new(ResourceKind::ServiceTypes)
            .keyed_by("service_type_id")
            .col("name", FieldKind::String);
        assert_eq!(config.key_column, "service_type_id");
        assert!(!config.schema.contains("id"));
        assert_eq!(
            config.schema.get("service_type_id"),
            Some(&FieldSpec {
                kind: FieldKind::String,
                nullable: false
            })
        );
    }

    #[test]
    fn relationships_declare_their_local_columns() {
        let config = ResourceTypeConfig::new(ResourceKind::WorkflowStatuses)
            .belongs_to_not_null("workflow", "workflow_id", ResourceKind::Workflows)
            .belongs_to_via(
                "service_type",
                "service_type_id",
                ResourceKind::ServiceTypes,
                "service_type_id",
            );
        assert_eq!(config.schema.get("workflow_id").map(|s| s.nullable), Some(false));
        assert_eq!(config.relationships[0].lookup_column(), "id");
        assert_eq!(config.relationships[1].lookup_column(), "service_type_id");
        assert!(config.relationship_for_column("workflow_id").is_some());
    }

    #[test]
    fn field_schema_deserializes_with_nullable_default() {
        let schema: FieldSchema =
            serde_json::from_str(r#"{"name": {"kind": "string", "nullable": false}, "budget": {"kind": "numeric"}}"#)
                .expect("schema");
        assert_eq!(schema.get("budget").map(|s| s.nullable), Some(true));
        assert_eq!(schema.get("name").map(|s| s.kind), Some(FieldKind::String));
    }
}
