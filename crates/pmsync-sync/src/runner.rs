//! Bounded-parallel execution of ordered resource batches.
//!
//! Batches are grouped into waves of unrelated kinds. Inside a wave, envelopes
//! that share a kind and id form one lane and run in input order; lanes run
//! concurrently under a semaphore.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pmsync_core::{DanglingReferenceWarning, PipelineStage, ResourceKind};
use pmsync_resources::Catalog;
use pmsync_storage::RecordStore;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::sync_resource;
use crate::envelope::peek_id;

/// The decoded resource objects of one kind, in the order they were received.
#[derive(Debug, Clone)]
pub struct ResourceBatch {
    pub kind: ResourceKind,
    pub envelopes: Vec<JsonValue>,
}

impl ResourceBatch {
    pub fn new(kind: ResourceKind, envelopes: Vec<JsonValue>) -> Self {
        Self { kind, envelopes }
    }
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub max_in_flight: usize,
    /// Measured from the start of the run; checked before each envelope starts.
    pub deadline: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Written,
    Failed,
    Skipped,
}

impl EnvelopeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeStatus::Written => "written",
            EnvelopeStatus::Failed => "failed",
            EnvelopeStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeResult {
    pub kind: ResourceKind,
    pub resource_id: Option<String>,
    pub status: EnvelopeStatus,
    /// Last stage reached.
    pub stage: PipelineStage,
    pub warnings: Vec<DanglingReferenceWarning>,
    pub error: Option<String>,
    #[serde(skip)]
    position: (usize, usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub written: usize,
    pub failed: usize,
    pub skipped: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The deadline passed before every envelope could start.
    pub aborted: bool,
    pub kinds: BTreeMap<ResourceKind, KindSummary>,
    pub results: Vec<EnvelopeResult>,
}

impl SyncReport {
    pub fn written(&self) -> usize {
        self.kinds.values().map(|k| k.written).sum()
    }

    pub fn failed(&self) -> usize {
        self.kinds.values().map(|k| k.failed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.kinds.values().map(|k| k.skipped).sum()
    }

    pub fn warnings(&self) -> usize {
        self.kinds.values().map(|k| k.warnings).sum()
    }

    pub fn summary_for(&self, kind: ResourceKind) -> KindSummary {
        self.kinds.get(&kind).copied().unwrap_or_default()
    }
}

pub struct SyncRunner<S: ?Sized> {
    store: Arc<S>,
    catalog: Arc<Catalog>,
    config: RunnerConfig,
}

struct Lane {
    kind: ResourceKind,
    envelopes: Vec<((usize, usize), JsonValue)>,
}

impl<S> SyncRunner<S>
where
    S: RecordStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, catalog: Arc<Catalog>, config: RunnerConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    /// Groups consecutive batches into waves. A batch joins the current wave only
    /// when it is of a new kind and unrelated to every kind already in the wave.
    pub fn plan_waves(&self, batches: &[ResourceBatch]) -> Vec<Vec<usize>> {
        let mut waves: Vec<Vec<usize>> = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let joins_current = waves.last().is_some_and(|wave| {
                wave.iter().all(|&other| {
                    let other = batches[other].kind;
                    other != batch.kind && !self.catalog.related(other, batch.kind)
                })
            });
            match waves.last_mut() {
                Some(wave) if joins_current => wave.push(index),
                _ => waves.push(vec![index]),
            }
        }
        waves
    }

    pub async fn run(&self, batches: Vec<ResourceBatch>) -> Result<SyncReport> {
        for batch in &batches {
            self.catalog
                .config_for(batch.kind)
                .with_context(|| format!("no configuration for batch of {}", batch.kind))?;
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let deadline = self.config.deadline.map(|limit| Instant::now() + limit);
        let semaphore = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let waves = self.plan_waves(&batches);
        info!(%run_id, batches = batches.len(), waves = waves.len(), "sync run started");

        let mut slots: Vec<Option<ResourceBatch>> = batches.into_iter().map(Some).collect();
        let mut results = Vec::new();
        for wave in waves {
            let mut lanes: BTreeMap<(ResourceKind, Option<String>, (usize, usize)), Lane> =
                BTreeMap::new();
            for batch_index in wave {
                let Some(batch) = slots[batch_index].take() else {
                    continue;
                };
                for (envelope_index, raw) in batch.envelopes.into_iter().enumerate() {
                    // Envelopes without a readable id each get their own lane.
                    let lane_key = match peek_id(&raw) {
                        Some(id) => (batch.kind, Some(id), (0, 0)),
                        None => (batch.kind, None, (batch_index, envelope_index)),
                    };
                    lanes
                        .entry(lane_key)
                        .or_insert_with(|| Lane {
                            kind: batch.kind,
                            envelopes: Vec::new(),
                        })
                        .envelopes
                        .push(((batch_index, envelope_index), raw));
                }
            }

            let mut tasks = JoinSet::new();
            for lane in lanes.into_values() {
                tasks.spawn(run_lane(
                    Arc::clone(&self.store),
                    Arc::clone(&self.catalog),
                    Arc::clone(&semaphore),
                    deadline,
                    lane,
                ));
            }
            while let Some(joined) = tasks.join_next().await {
                results.extend(joined.context("sync lane task failed")??);
            }
        }

        results.sort_by_key(|result| result.position);
        let mut kinds: BTreeMap<ResourceKind, KindSummary> = BTreeMap::new();
        for result in &results {
            let summary = kinds.entry(result.kind).or_default();
            match result.status {
                EnvelopeStatus::Written => summary.written += 1,
                EnvelopeStatus::Failed => summary.failed += 1,
                EnvelopeStatus::Skipped => summary.skipped += 1,
            }
            summary.warnings += result.warnings.len();
        }

        let report = SyncReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            aborted: results
                .iter()
                .any(|result| result.status == EnvelopeStatus::Skipped),
            kinds,
            results,
        };
        info!(
            %run_id,
            written = report.written(),
            failed = report.failed(),
            skipped = report.skipped(),
            warnings = report.warnings(),
            aborted = report.aborted,
            "sync run finished"
        );
        Ok(report)
    }
}

async fn run_lane<S>(
    store: Arc<S>,
    catalog: Arc<Catalog>,
    semaphore: Arc<Semaphore>,
    deadline: Option<Instant>,
    lane: Lane,
) -> Result<Vec<EnvelopeResult>>
where
    S: RecordStore + ?Sized,
{
    let config = catalog.config_for(lane.kind)?;
    let mut results = Vec::with_capacity(lane.envelopes.len());
    for (position, raw) in lane.envelopes {
        let resource_id = peek_id(&raw);
        let _permit = semaphore
            .acquire()
            .await
            .context("sync semaphore closed")?;

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            warn!(kind = %lane.kind, resource_id = resource_id.as_deref(), "deadline passed; skipping envelope");
            results.push(EnvelopeResult {
                kind: lane.kind,
                resource_id,
                status: EnvelopeStatus::Skipped,
                stage: PipelineStage::Received,
                warnings: Vec::new(),
                error: None,
                position,
            });
            continue;
        }

        let result = match sync_resource(store.as_ref(), config, &raw).await {
            Ok(outcome) => EnvelopeResult {
                kind: lane.kind,
                resource_id: Some(outcome.resource_id),
                status: EnvelopeStatus::Written,
                stage: PipelineStage::Written,
                warnings: outcome.warnings,
                error: None,
                position,
            },
            Err(err) => {
                error!(kind = %lane.kind, resource_id = resource_id.as_deref(), error = %err, "envelope failed");
                EnvelopeResult {
                    kind: lane.kind,
                    resource_id: err.resource_id().map(str::to_string).or(resource_id),
                    status: EnvelopeStatus::Failed,
                    stage: err.stage(),
                    warnings: Vec::new(),
                    error: Some(err.to_string()),
                    position,
                }
            }
        };
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmsync_storage::MemoryStore;
    use serde_json::json;

    fn runner(config: RunnerConfig) -> (Arc<MemoryStore>, SyncRunner<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let runner = SyncRunner::new(Arc::clone(&store), Arc::new(Catalog::builtin()), config);
        (store, runner)
    }

    fn batch(kind: ResourceKind) -> ResourceBatch {
        ResourceBatch::new(kind, Vec::new())
    }

    #[test]
    fn waves_split_on_dependencies_and_repeated_kinds() {
        let (_, runner) = runner(RunnerConfig::default());
        let batches = vec![
            batch(ResourceKind::Workflows),
            batch(ResourceKind::TaxRates),
            batch(ResourceKind::Projects),
            batch(ResourceKind::Projects),
            batch(ResourceKind::Holidays),
            batch(ResourceKind::Boards),
        ];
        assert_eq!(
            runner.plan_waves(&batches),
            vec![vec![0, 1], vec![2], vec![3, 4], vec![5]]
        );
    }

    #[tokio::test]
    async fn parents_written_in_earlier_waves_resolve() {
        let (store, runner) = runner(RunnerConfig::default());
        let report = runner
            .run(vec![
                ResourceBatch::new(
                    ResourceKind::Companies,
                    vec![json!({"id": "7", "type": "companies", "attributes": {"name": "Acme"}})],
                ),
                ResourceBatch::new(
                    ResourceKind::Projects,
                    vec![
                        json!({
                            "id": "42",
                            "type": "projects",
                            "attributes": {"name": "Site"},
                            "relationships": {"company": {"data": {"id": "7", "type": "companies"}}}
                        }),
                        json!({"id": "43", "type": "projects", "attributes": {}}),
                        json!({"type": "projects"}),
                    ],
                ),
            ])
            .await
            .expect("run");

        assert!(!report.aborted);
        assert_eq!(report.written(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.warnings(), 0);
        assert_eq!(report.results[2].resource_id.as_deref(), Some("43"));
        assert_eq!(report.results[2].stage, PipelineStage::Unwrapped);
        assert_eq!(report.results[3].stage, PipelineStage::Received);

        let project = store
            .find("projects", "id", "42")
            .await
            .expect("find")
            .expect("row");
        assert_eq!(project.get("company_id"), Some(&pmsync_core::Value::from("7")));
    }

    #[tokio::test]
    async fn repeated_ids_apply_in_input_order() {
        let (store, runner) = runner(RunnerConfig {
            max_in_flight: 4,
            deadline: None,
        });
        let envelopes = (0..5)
            .map(|n| json!({"id": "1", "type": "companies", "attributes": {"name": format!("v{n}")}}))
            .collect();
        let report = runner
            .run(vec![ResourceBatch::new(ResourceKind::Companies, envelopes)])
            .await
            .expect("run");

        assert_eq!(report.summary_for(ResourceKind::Companies).written, 5);
        let row = store
            .find("companies", "id", "1")
            .await
            .expect("find")
            .expect("row");
        assert_eq!(row.get("name"), Some(&pmsync_core::Value::from("v4")));
    }

    #[tokio::test]
    async fn elapsed_deadline_skips_everything() {
        let (store, runner) = runner(RunnerConfig {
            max_in_flight: 2,
            deadline: Some(Duration::ZERO),
        });
        let report = runner
            .run(vec![ResourceBatch::new(
                ResourceKind::Companies,
                vec![json!({"id": "1", "attributes": {"name": "A"}})],
            )])
            .await
            .expect("run");

        assert!(report.aborted);
        assert_eq!(report.skipped(), 1);
        assert_eq!(store.write_count(), 0);
    }
}
