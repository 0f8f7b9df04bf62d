//! Storage interface for mirrored resources, plus the in-memory and postgres backends
//! and the immutable raw page archive.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pmsync_core::{Row, StoreError, StoredRecord, Value};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::RwLock;

mod postgres;

pub use postgres::{create_table_sql, decode_row, pg_type, quote_ident, upsert_sql, PgStore};

pub const CRATE_NAME: &str = "pmsync-storage";

/// Point lookups by column plus an atomic create-or-update keyed by one column.
///
/// Implementations must give read-your-writes consistency within a sync run: a row
/// upserted earlier must be visible to later `exists`/`find` calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn exists(&self, table: &str, column: &str, value: &str) -> Result<bool, StoreError>;

    async fn find(&self, table: &str, column: &str, value: &str)
        -> Result<Option<Row>, StoreError>;

    /// Overwrites every supplied column of the row whose `key` matches, or inserts it.
    async fn upsert(&self, table: &str, key: &str, record: &StoredRecord)
        -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryTable {
    rows: BTreeMap<String, Row>,
}

/// Process-local store. Rows are keyed by the text form of their key column.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row directly, bypassing the pipeline. Useful for seeding parents.
    pub async fn insert_row(&self, table: &str, key: &str, row: Row) -> Result<(), StoreError> {
        let key_value = row
            .get(key)
            .and_then(Value::to_sql_text)
            .ok_or_else(|| StoreError::MissingKey {
                table: table.to_string(),
                key: key.to_string(),
            })?;
        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .rows
            .insert(key_value, row);
        Ok(())
    }

    pub async fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.read().await;
        tables
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn row_count(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    /// Number of `upsert` calls that reached this store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn row_matches(row: &Row, column: &str, value: &str) -> bool {
    row.get(column)
        .and_then(Value::to_sql_text)
        .is_some_and(|text| text == value)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn exists(&self, table: &str, column: &str, value: &str) -> Result<bool, StoreError> {
        Ok(self.find(table, column, value).await?.is_some())
    }

    async fn find(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<Row>, StoreError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(table) else {
            return Ok(None);
        };
        if let Some(row) = table.rows.get(value) {
            if row_matches(row, column, value) {
                return Ok(Some(row.clone()));
            }
        }
        Ok(table
            .rows
            .values()
            .find(|row| row_matches(row, column, value))
            .cloned())
    }

    async fn upsert(
        &self,
        table: &str,
        key: &str,
        record: &StoredRecord,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let key_value = record
            .columns
            .get(key)
            .and_then(Value::to_sql_text)
            .ok_or_else(|| StoreError::MissingKey {
                table: table.to_string(),
                key: key.to_string(),
            })?;

        let mut tables = self.tables.write().await;
        let row = tables
            .entry(table.to_string())
            .or_default()
            .rows
            .entry(key_value)
            .or_default();
        for (column, value) in &record.columns {
            row.insert(column.clone(), value.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ArchivedPage {
    pub content_hash: String,
    /// Relative to the archive root: `%Y%m%d/<type>/<sha256>.json`.
    pub path: PathBuf,
    pub deduplicated: bool,
}

/// Immutable, hash-addressed copies of the raw pages handed to the engine.
#[derive(Debug, Clone)]
pub struct PageArchive {
    root: PathBuf,
}

impl PageArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sha256_hex(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    pub async fn archive_page(
        &self,
        received_at: DateTime<Utc>,
        resource_type: &str,
        bytes: &[u8],
    ) -> anyhow::Result<ArchivedPage> {
        let content_hash = Self::sha256_hex(bytes);
        let dir = PathBuf::from(received_at.format("%Y%m%d").to_string()).join(resource_type);
        let path = dir.join(format!("{content_hash}.json"));
        let target = self.root.join(&path);

        if fs::try_exists(&target)
            .await
            .with_context(|| format!("checking {}", target.display()))?
        {
            return Ok(ArchivedPage {
                content_hash,
                path,
                deduplicated: true,
            });
        }

        // Readers never see a partial page: write aside, then rename into place.
        fs::create_dir_all(self.root.join(&dir))
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
        let partial = target.with_extension("json.partial");
        fs::write(&partial, bytes)
            .await
            .with_context(|| format!("writing {}", partial.display()))?;
        fs::rename(&partial, &target)
            .await
            .with_context(|| format!("moving page into {}", target.display()))?;

        Ok(ArchivedPage {
            content_hash,
            path,
            deduplicated: false,
        })
    }
}
