//! Postgres backend. Table and column names come from the resource catalog, so
//! every identifier is checked against `[a-z_][a-z0-9_]*` and quoted before it
//! reaches SQL; values are always bound.

use std::time::Duration;

use async_trait::async_trait;
use pmsync_core::{FieldKind, ResourceTypeConfig, Row, StoreError, StoredRecord, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _};
use tracing::{debug, info};

use crate::RecordStore;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(StoreError::backend)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates any missing table for the given resource types. Existing tables are left as-is.
    pub async fn ensure_tables<'a>(
        &self,
        configs: impl IntoIterator<Item = &'a ResourceTypeConfig>,
    ) -> Result<usize, StoreError> {
        let mut count = 0usize;
        for config in configs {
            let sql = create_table_sql(config)?;
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .map_err(StoreError::backend)?;
            debug!(table = config.table(), "ensured table");
            count += 1;
        }
        info!(tables = count, "storage tables ensured");
        Ok(count)
    }
}

pub fn quote_ident(name: &str) -> Result<String, StoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid_start && valid_rest && name.len() <= 63 {
        Ok(format!("\"{name}\""))
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

pub fn pg_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "text",
        FieldKind::Integer => "bigint",
        FieldKind::Numeric => "numeric",
        FieldKind::Date => "date",
        FieldKind::Timestamp => "timestamptz",
        FieldKind::Boolean => "boolean",
        FieldKind::Json => "jsonb",
    }
}

pub fn create_table_sql(config: &ResourceTypeConfig) -> Result<String, StoreError> {
    let mut columns = Vec::with_capacity(config.schema.len());
    for (column, spec) in config.schema.iter() {
        let mut definition = format!("{} {}", quote_ident(column)?, pg_type(spec.kind));
        if column == config.key_column {
            definition.push_str(" PRIMARY KEY");
        } else if !spec.nullable {
            definition.push_str(" NOT NULL");
        }
        columns.push(definition);
    }
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(config.table())?,
        columns.join(",\n    ")
    ))
}

/// Builds the parameterized upsert for `record`. Non-null values bind as text and
/// are cast to the column type; nulls are written as an untyped `NULL` literal.
pub fn upsert_sql<'a>(
    table: &str,
    key: &str,
    record: &'a StoredRecord,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    if !record.columns.contains_key(key) {
        return Err(StoreError::MissingKey {
            table: table.to_string(),
            key: key.to_string(),
        });
    }

    let quoted_columns = record
        .columns
        .keys()
        .map(|column| quote_ident(column))
        .collect::<Result<Vec<_>, _>>()?;
    let quoted_key = quote_ident(key)?;

    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        quote_ident(table)?,
        quoted_columns.join(", ")
    ));
    for (index, (column, value)) in record.columns.iter().enumerate() {
        if index > 0 {
            qb.push(", ");
        }
        match value.to_sql_text() {
            None => {
                qb.push("NULL");
            }
            Some(text) => {
                qb.push("CAST(");
                qb.push_bind(text);
                qb.push(format!(" AS {})", pg_type(record.kind_of(column))));
            }
        }
    }

    let assignments = quoted_columns
        .iter()
        .filter(|column| **column != quoted_key)
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect::<Vec<_>>();
    if assignments.is_empty() {
        qb.push(format!(") ON CONFLICT ({quoted_key}) DO NOTHING"));
    } else {
        qb.push(format!(
            ") ON CONFLICT ({quoted_key}) DO UPDATE SET {}",
            assignments.join(", ")
        ));
    }
    Ok(qb)
}

/// Decodes `row_to_json` output. Only `jsonb` columns come back as arrays or
/// objects; they are re-encoded to the same text the memory store keeps.
pub fn decode_row(text: &str) -> Result<Row, StoreError> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(StoreError::decode)?;
    match Value::from(json) {
        Value::Map(columns) => Ok(columns
            .into_iter()
            .map(|(column, value)| {
                if value.is_composite() {
                    (column, Value::String(value.to_json_text()))
                } else {
                    (column, value)
                }
            })
            .collect()),
        other => Err(StoreError::decode(format!(
            "expected a row object, got {}",
            other.type_name()
        ))),
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn exists(&self, table: &str, column: &str, value: &str) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE CAST({} AS text) = $1)",
            quote_ident(table)?,
            quote_ident(column)?
        );
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)
    }

    async fn find(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<Row>, StoreError> {
        let sql = format!(
            "SELECT row_to_json(t)::text AS row FROM {} t WHERE CAST(t.{} AS text) = $1 LIMIT 1",
            quote_ident(table)?,
            quote_ident(column)?
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let text: String = row.try_get("row").map_err(StoreError::decode)?;
        decode_row(&text).map(Some)
    }

    async fn upsert(
        &self,
        table: &str,
        key: &str,
        record: &StoredRecord,
    ) -> Result<(), StoreError> {
        let mut qb = upsert_sql(table, key, record)?;
        qb.build()
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }
}
