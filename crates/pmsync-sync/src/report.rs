use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{RecordBatch, StringArray, UInt32Array};
use arrow_schema::{DataType, Field as ArrowField, Schema};
use parquet::arrow::ArrowWriter;
use pmsync_storage::PageArchive;
use serde::Serialize;
use tokio::fs;

use crate::runner::SyncReport;

#[derive(Debug, Clone, Serialize)]
pub struct ReportFiles {
    pub reports_dir: PathBuf,
    pub report_json: PathBuf,
    pub outcomes_parquet: PathBuf,
    pub outcomes_sha256: String,
}

/// Writes `<reports_root>/<run_id>/sync_report.json` and `outcomes.parquet`.
pub async fn write_run_report(reports_root: &Path, report: &SyncReport) -> Result<ReportFiles> {
    let reports_dir = reports_root.join(report.run_id.to_string());
    fs::create_dir_all(&reports_dir)
        .await
        .with_context(|| format!("creating {}", reports_dir.display()))?;

    let report_json = reports_dir.join("sync_report.json");
    let bytes = serde_json::to_vec_pretty(report).context("serializing sync report")?;
    fs::write(&report_json, bytes)
        .await
        .with_context(|| format!("writing {}", report_json.display()))?;

    let outcomes_parquet = reports_dir.join("outcomes.parquet");
    write_outcomes_parquet(&outcomes_parquet, report)?;
    let parquet_bytes = fs::read(&outcomes_parquet)
        .await
        .with_context(|| format!("reading {}", outcomes_parquet.display()))?;

    Ok(ReportFiles {
        reports_dir,
        report_json,
        outcomes_parquet,
        outcomes_sha256: PageArchive::sha256_hex(&parquet_bytes),
    })
}

fn write_parquet(path: &Path, batch: RecordBatch) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .with_context(|| format!("opening parquet writer {}", path.display()))?;
    writer
        .write(&batch)
        .with_context(|| format!("writing record batch {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("closing parquet writer {}", path.display()))?;
    Ok(())
}

fn write_outcomes_parquet(path: &Path, report: &SyncReport) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("kind", DataType::Utf8, false),
        ArrowField::new("resource_id", DataType::Utf8, true),
        ArrowField::new("status", DataType::Utf8, false),
        ArrowField::new("stage", DataType::Utf8, false),
        ArrowField::new("warnings", DataType::UInt32, false),
        ArrowField::new("error", DataType::Utf8, true),
    ]));

    let results = &report.results;
    let kinds = StringArray::from(
        results
            .iter()
            .map(|r| Some(r.kind.api_type()))
            .collect::<Vec<_>>(),
    );
    let resource_ids = StringArray::from(
        results
            .iter()
            .map(|r| r.resource_id.as_deref())
            .collect::<Vec<_>>(),
    );
    let statuses = StringArray::from(
        results
            .iter()
            .map(|r| Some(r.status.as_str()))
            .collect::<Vec<_>>(),
    );
    let stages = StringArray::from(
        results
            .iter()
            .map(|r| Some(r.stage.as_str()))
            .collect::<Vec<_>>(),
    );
    let warnings = UInt32Array::from(
        results
            .iter()
            .map(|r| r.warnings.len() as u32)
            .collect::<Vec<_>>(),
    );
    let errors = StringArray::from(
        results
            .iter()
            .map(|r| r.error.as_deref())
            .collect::<Vec<_>>(),
    );

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(kinds),
            Arc::new(resource_ids),
            Arc::new(statuses),
            Arc::new(stages),
            Arc::new(warnings),
            Arc::new(errors),
        ],
    )
    .context("building outcomes record batch")?;
    write_parquet(path, batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{ResourceBatch, RunnerConfig, SyncRunner};
    use pmsync_core::ResourceKind;
    use pmsync_resources::Catalog;
    use pmsync_storage::MemoryStore;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_json_and_parquet_under_the_run_id() {
        let runner = SyncRunner::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Catalog::builtin()),
            RunnerConfig::default(),
        );
        let report = runner
            .run(vec![ResourceBatch::new(
                ResourceKind::Companies,
                vec![
                    json!({"id": "1", "type": "companies", "attributes": {"name": "Acme"}}),
                    json!({"id": "2", "type": "companies", "attributes": {}}),
                ],
            )])
            .await
            .expect("run");

        let dir = tempdir().expect("tempdir");
        let files = write_run_report(dir.path(), &report).await.expect("report");

        assert_eq!(files.reports_dir, dir.path().join(report.run_id.to_string()));
        assert!(files.outcomes_parquet.exists());
        assert_eq!(files.outcomes_sha256.len(), 64);

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&files.report_json).expect("read"))
                .expect("json");
        assert_eq!(written["kinds"]["companies"]["written"], 1);
        assert_eq!(written["kinds"]["companies"]["failed"], 1);
        assert_eq!(written["results"][1]["stage"], "unwrapped");
        assert_eq!(written["aborted"], false);
    }
}
