use async_trait::async_trait;
use pmsync_core::{
    FieldKind, PipelineStage, ResourceKind, ResourceTypeConfig, Row, StoreError, StoredRecord,
    SyncError, Value,
};
use pmsync_resources::Catalog;
use pmsync_storage::{MemoryStore, RecordStore};
use pmsync_sync::{decode_json_field, sync_resource};
use serde_json::{json, Value as JsonValue};

fn config(kind: ResourceKind) -> ResourceTypeConfig {
    Catalog::builtin()
        .config_for(kind)
        .expect("builtin config")
        .clone()
}

fn project_42() -> JsonValue {
    json!({
        "id": "42",
        "type": "projects",
        "attributes": {"name": "Acme Site"},
        "relationships": {"company": {"data": {"id": "7"}}}
    })
}

async fn seed_company(store: &MemoryStore, id: &str) {
    store
        .insert_row(
            "companies",
            "id",
            Row::from([
                ("id".to_string(), Value::from(id)),
                ("type".to_string(), Value::from("companies")),
                ("name".to_string(), Value::from("Acme")),
            ]),
        )
        .await
        .expect("seed company");
}

#[tokio::test]
async fn missing_company_is_stored_as_null_with_one_warning() {
    let store = MemoryStore::new();
    let outcome = sync_resource(&store, &config(ResourceKind::Projects), &project_42())
        .await
        .expect("sync succeeds");

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].api_key, "company");
    assert_eq!(outcome.warnings[0].target_id, "7");

    let row = store
        .find("projects", "id", "42")
        .await
        .expect("find")
        .expect("stored");
    assert_eq!(row.get("id"), Some(&Value::from("42")));
    assert_eq!(row.get("type"), Some(&Value::from("projects")));
    assert_eq!(row.get("name"), Some(&Value::from("Acme Site")));
    assert_eq!(row.get("company_id"), Some(&Value::Null));
}

#[tokio::test]
async fn existing_company_is_linked_without_warning() {
    let store = MemoryStore::new();
    seed_company(&store, "7").await;

    let outcome = sync_resource(&store, &config(ResourceKind::Projects), &project_42())
        .await
        .expect("sync succeeds");

    assert!(outcome.warnings.is_empty());
    let row = store
        .find("projects", "id", "42")
        .await
        .expect("find")
        .expect("stored");
    assert_eq!(row.get("company_id"), Some(&Value::from("7")));
}

#[tokio::test]
async fn one_warning_per_unresolved_relationship() {
    let store = MemoryStore::new();
    let outcome = sync_resource(
        &store,
        &config(ResourceKind::Projects),
        &json!({
            "id": "42",
            "type": "projects",
            "attributes": {"name": "Acme Site"},
            "relationships": {
                "company": {"data": {"id": "7", "type": "companies"}},
                "project_manager": {"data": {"id": "3", "type": "people"}},
                "last_actor": {"data": null}
            }
        }),
    )
    .await
    .expect("sync succeeds");

    let mut keys: Vec<_> = outcome.warnings.iter().map(|w| w.api_key.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["company", "project_manager"]);
    assert_eq!(outcome.record.get("last_actor_id"), Some(&Value::Null));
}

#[tokio::test]
async fn empty_attributes_fail_the_required_gate_before_storage() {
    let store = MemoryStore::new();
    let err = sync_resource(
        &store,
        &config(ResourceKind::Projects),
        &json!({"id": "42", "type": "projects", "attributes": {}}),
    )
    .await
    .expect_err("name is required");

    match err {
        SyncError::MissingRequiredFields {
            resource_id,
            missing_keys,
        } => {
            assert_eq!(resource_id, "42");
            assert_eq!(missing_keys, vec!["name"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.row_count("projects").await, 0);
}

#[tokio::test]
async fn every_required_kind_rejects_empty_attributes_without_writing() {
    let catalog = Catalog::builtin();
    let store = MemoryStore::new();
    for config in catalog.configs().filter(|c| !c.required_fields.is_empty()) {
        let err = sync_resource(
            &store,
            config,
            &json!({"id": "1", "type": config.kind.api_type(), "attributes": {}}),
        )
        .await
        .expect_err("required fields missing");
        assert!(
            matches!(err, SyncError::MissingRequiredFields { ref missing_keys, .. } if *missing_keys == config.required_fields),
            "{}: {err}",
            config.kind
        );
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn non_numeric_budget_is_rejected_without_writing() {
    let store = MemoryStore::new();
    let config = ResourceTypeConfig::new(ResourceKind::Projects)
        .col_not_null("name", FieldKind::String)
        .col("budget", FieldKind::Numeric);

    let err = sync_resource(
        &store,
        &config,
        &json!({"id": "42", "type": "projects", "attributes": {"name": "Acme", "budget": "a lot"}}),
    )
    .await
    .expect_err("schema violation");

    let SyncError::SchemaValidation {
        resource_id,
        violations,
    } = err
    else {
        panic!("expected schema validation error");
    };
    assert_eq!(resource_id, "42");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].column, "budget");
    assert_eq!(violations[0].expected_kind, FieldKind::Numeric);
    assert_eq!(violations[0].actual_value, Value::from("a lot"));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn syncing_twice_leaves_an_identical_record() {
    let store = MemoryStore::new();
    seed_company(&store, "7").await;
    let envelope = json!({
        "id": "42",
        "type": "projects",
        "attributes": {
            "name": "Acme Site",
            "budget_closing_date": "2026-05-01",
            "tag_list": ["web", "retainer"],
            "custom_fields": {"b": [1, 2], "a": {"nested": true}}
        },
        "relationships": {"company": {"data": {"id": "7", "type": "companies"}}}
    });
    let config = config(ResourceKind::Projects);

    let first = sync_resource(&store, &config, &envelope).await.expect("first");
    let after_first = store.rows("projects").await;
    let second = sync_resource(&store, &config, &envelope).await.expect("second");
    let after_second = store.rows("projects").await;

    assert_eq!(first.record, second.record);
    assert_eq!(after_first, after_second);
    assert_eq!(after_second.len(), 1);
    assert_eq!(
        serde_json::to_vec(&first.record).expect("encode"),
        serde_json::to_vec(&second.record).expect("encode")
    );
}

#[tokio::test]
async fn self_referencing_task_is_stable_across_syncs() {
    let store = MemoryStore::new();
    let task = json!({
        "id": "9",
        "type": "tasks",
        "attributes": {"title": "Umbrella"},
        "relationships": {"parent_task": {"data": {"id": "9", "type": "tasks"}}}
    });
    let config = config(ResourceKind::Tasks);

    let first = sync_resource(&store, &config, &task).await.expect("first");
    let after_first = store.rows("tasks").await;
    let second = sync_resource(&store, &config, &task).await.expect("second");

    assert!(first.warnings.is_empty());
    assert_eq!(first.record.get("parent_task_id"), Some(&Value::from("9")));
    assert_eq!(first.record, second.record);
    assert_eq!(after_first, store.rows("tasks").await);
}

#[tokio::test]
async fn json_columns_decode_back_to_the_original_value() {
    let store = MemoryStore::new();
    let custom_fields = json!({"priority": "high", "scores": [1, 2.5, null], "meta": {"x": false}});
    sync_resource(
        &store,
        &config(ResourceKind::Projects),
        &json!({
            "id": "42",
            "type": "projects",
            "attributes": {"name": "Acme Site", "custom_fields": custom_fields.clone()}
        }),
    )
    .await
    .expect("sync");

    let row = store
        .find("projects", "id", "42")
        .await
        .expect("find")
        .expect("stored");
    let stored = row.get("custom_fields").expect("column");
    assert!(matches!(stored, Value::String(_)));
    assert_eq!(decode_json_field(stored), Some(Value::from(custom_fields)));
}

#[tokio::test]
async fn json_columns_keep_integers_beyond_i64_exact() {
    let store = MemoryStore::new();
    let custom_fields = json!({"external_ref": u64::MAX, "offset": i64::MIN});
    sync_resource(
        &store,
        &config(ResourceKind::Projects),
        &json!({
            "id": "42",
            "type": "projects",
            "attributes": {"name": "Acme Site", "custom_fields": custom_fields.clone()}
        }),
    )
    .await
    .expect("sync");

    let row = store
        .find("projects", "id", "42")
        .await
        .expect("find")
        .expect("stored");
    let stored = row.get("custom_fields").expect("column");
    assert_eq!(
        stored.as_str(),
        Some(r#"{"external_ref":18446744073709551615,"offset":-9223372036854775808}"#)
    );
    let decoded = decode_json_field(stored).expect("decodes");
    assert_eq!(decoded.to_json(), custom_fields);
}

#[tokio::test]
async fn alternate_keys_store_and_resolve_by_natural_key() {
    let store = MemoryStore::new();
    sync_resource(
        &store,
        &config(ResourceKind::ServiceTypes),
        &json!({"id": "900", "type": "service_types", "attributes": {"name": "Design"}}),
    )
    .await
    .expect("service type");

    let row = store
        .find("service_types", "service_type_id", "900")
        .await
        .expect("find")
        .expect("stored");
    assert!(!row.contains_key("id"));

    let outcome = sync_resource(
        &store,
        &config(ResourceKind::Services),
        &json!({
            "id": "55",
            "type": "services",
            "attributes": {"name": "Wireframes"},
            "relationships": {"service_type": {"data": {"id": "900", "type": "service_types"}}}
        }),
    )
    .await
    .expect("service");
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.record.get("service_type_id"), Some(&Value::from("900")));
}

#[tokio::test]
async fn non_null_relationship_is_enforced_by_the_schema_gate() {
    let store = MemoryStore::new();
    let err = sync_resource(
        &store,
        &config(ResourceKind::WorkflowStatuses),
        &json!({
            "id": "3",
            "type": "workflow_statuses",
            "attributes": {"name": "Done"},
            "relationships": {"workflow": {"data": {"id": "1", "type": "workflows"}}}
        }),
    )
    .await
    .expect_err("workflow is missing");

    let SyncError::SchemaValidation { violations, .. } = err else {
        panic!("expected schema validation error");
    };
    assert_eq!(violations[0].column, "workflow_id");
    assert_eq!(violations[0].actual_value, Value::Null);
    assert_eq!(store.write_count(), 0);
}

struct RejectingWrites {
    inner: MemoryStore,
}

#[async_trait]
impl RecordStore for RejectingWrites {
    async fn exists(&self, table: &str, column: &str, value: &str) -> Result<bool, StoreError> {
        self.inner.exists(table, column, value).await
    }

    async fn find(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<Row>, StoreError> {
        self.inner.find(table, column, value).await
    }

    async fn upsert(&self, _: &str, _: &str, _: &StoredRecord) -> Result<(), StoreError> {
        Err(StoreError::backend("disk full"))
    }
}

#[tokio::test]
async fn upsert_failures_propagate_with_the_resource_id() {
    let store = RejectingWrites {
        inner: MemoryStore::new(),
    };
    let err = sync_resource(&store, &config(ResourceKind::Projects), &project_42())
        .await
        .expect_err("write fails");

    assert_eq!(err.resource_id(), Some("42"));
    assert_eq!(err.stage(), PipelineStage::SchemaValidated);
    assert!(err.to_string().contains("disk full"));
    assert!(matches!(
        err,
        SyncError::Storage {
            source: StoreError::Backend(_),
            ..
        }
    ));
}

#[tokio::test]
async fn missing_id_is_an_input_shape_error() {
    let store = MemoryStore::new();
    let err = sync_resource(
        &store,
        &config(ResourceKind::Projects),
        &json!({"type": "projects", "attributes": {"name": "x"}}),
    )
    .await
    .expect_err("no id");
    assert!(matches!(err, SyncError::InputShape { .. }));
    assert_eq!(err.stage(), PipelineStage::Received);
    assert_eq!(store.write_count(), 0);
}
