use std::path::Path;
use std::sync::Arc;

use pmsync_core::Value;
use pmsync_storage::{MemoryStore, RecordStore};
use pmsync_sync::{StoreBackend, SyncConfig, SyncPipeline};
use tempfile::tempdir;

#[tokio::test]
async fn sample_plan_mirrors_into_memory() {
    let dir = tempdir().expect("tempdir");
    let config = SyncConfig {
        database_url: String::new(),
        store: StoreBackend::Memory,
        plan_path: Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/sample/sync.yaml"),
        catalog_path: None,
        archive_dir: dir.path().join("archive"),
        reports_dir: dir.path().join("reports"),
        max_in_flight: 4,
        deadline_secs: None,
        db_max_connections: 1,
    };
    let store = Arc::new(MemoryStore::new());
    let pipeline = SyncPipeline::new(config).expect("pipeline");

    let summary = pipeline.run_once(Arc::clone(&store)).await.expect("run");
    assert_eq!(summary.planned_kinds, 4);
    assert_eq!(summary.pages, 4);
    assert_eq!(summary.envelopes, 7);
    assert_eq!(summary.written, 6);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.warnings, 1);

    let globex = store
        .find("companies", "id", "8")
        .await
        .expect("find")
        .expect("globex");
    assert_eq!(globex.get("due_days"), Some(&Value::Int(15)));

    let site = store
        .find("projects", "id", "42")
        .await
        .expect("find")
        .expect("project");
    assert_eq!(site.get("company_id"), Some(&Value::from("7")));
    assert_eq!(site.get("project_manager_id"), Some(&Value::from("3")));
    assert_eq!(site.get("workflow_id"), Some(&Value::from("1")));
    assert_eq!(site.get("tag_list"), Some(&Value::from(r#"["web"]"#)));

    let orphan = store
        .find("projects", "id", "43")
        .await
        .expect("find")
        .expect("orphan");
    assert_eq!(orphan.get("company_id"), Some(&Value::Null));
    assert!(store.find("projects", "id", "44").await.expect("find").is_none());

    let rerun = pipeline.run_once(Arc::clone(&store)).await.expect("rerun");
    assert_eq!(rerun.deduplicated_pages, 4);
    assert_eq!(store.rows("projects").await.len(), 2);
}
