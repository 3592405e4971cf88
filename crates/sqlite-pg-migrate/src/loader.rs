//! Concurrent per-table bulk loading over the COPY protocol.

use crate::catalog::{Column, SqliteCatalog, Table};
use crate::ddl::quote_ident;
use crate::error::{MigrateError, Result};
use crate::summary::{ArtifactStatus, TransferSummary};
use crate::target::{copy_statement, encode_row, PgPool};
use crate::transform::{coerce_empty, SqlValue, TransformFn, Transformers};
use bytes::BytesMut;
use futures::{pin_mut, SinkExt, TryStreamExt};
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Decode, Row, TypeInfo, ValueRef};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Rows between summary progress updates and COPY buffer flushes.
const PROGRESS_INTERVAL: i64 = 1000;

/// Streams table data from the source into the target.
///
/// Each table's load owns one source cursor and one target connection with
/// one COPY channel for its whole duration; tables are isolated from each
/// other structurally. Any transformer failure aborts the table's COPY
/// without committing partial state.
pub struct BulkLoader {
    source: Arc<SqliteCatalog>,
    target: Arc<PgPool>,
    transformers: Transformers,
    summary: Arc<Mutex<TransferSummary>>,
}

impl BulkLoader {
    pub fn new(
        source: Arc<SqliteCatalog>,
        target: Arc<PgPool>,
        summary: Arc<Mutex<TransferSummary>>,
    ) -> Self {
        Self {
            source,
            target,
            transformers: Transformers::new(),
            summary,
        }
    }

    /// Copy every row of a table, recording progress in the summary.
    /// Returns the number of rows copied.
    pub async fn load_table(&self, table: &Table) -> Result<i64> {
        match self.copy_table(table).await {
            Ok(rows) => {
                self.set_data_status(&table.name, ArtifactStatus::Loaded(rows));
                info!("Finished loading {} rows of data into {}", rows, table.name);
                Ok(rows)
            }
            Err(e) => {
                self.set_data_status(&table.name, ArtifactStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn copy_table(&self, table: &Table) -> Result<i64> {
        debug!("Loading data into {}", table.name);

        // Transformers are resolved once per table, not per row.
        let plan = self.transformers.plan(&table.columns);

        let client = self.target.get().await?;
        let stmt = copy_statement(table);
        let sink = client.copy_in(stmt.as_str()).await?;
        pin_mut!(sink);

        let cols: Vec<String> = table
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect();
        // Engine-default row order; no ORDER BY is imposed.
        let query = format!(
            "SELECT {} FROM {}",
            cols.join(", "),
            quote_ident(&table.name)
        );
        let mut rows = sqlx::query(&query).fetch(self.source.pool());

        let mut buf = BytesMut::with_capacity(1024 * 1024);
        let mut rows_copied: i64 = 0;

        while let Some(row) = rows.try_next().await? {
            let values = self.transform_row(table, &plan, &row)?;
            encode_row(&mut buf, &values);
            rows_copied += 1;

            if rows_copied % PROGRESS_INTERVAL == 0 {
                sink.send(buf.split().freeze()).await.map_err(|e| {
                    MigrateError::transfer(&table.name, format!("COPY send failed: {}", e))
                })?;
                self.set_data_status(&table.name, ArtifactStatus::Loaded(rows_copied));
            }
        }

        if !buf.is_empty() {
            sink.send(buf.split().freeze()).await.map_err(|e| {
                MigrateError::transfer(&table.name, format!("COPY send failed: {}", e))
            })?;
        }
        sink.finish().await?;

        Ok(rows_copied)
    }

    /// Decode one source row and apply column-ordinal-aligned transformers.
    fn transform_row(
        &self,
        table: &Table,
        plan: &[Option<TransformFn>],
        row: &SqliteRow,
    ) -> Result<Vec<SqlValue>> {
        let mut values = Vec::with_capacity(table.columns.len());

        for (idx, column) in table.columns.iter().enumerate() {
            let mut value = decode_value(row, idx, &table.name, column)?;
            if let Some(transform) = plan[idx] {
                value = transform(column, value)?;
            }
            if !column.not_null {
                value = coerce_empty(value);
            }
            values.push(value);
        }

        Ok(values)
    }

    fn set_data_status(&self, table: &str, status: ArtifactStatus) {
        let mut summary = self.summary.lock().unwrap();
        if let Some(state) = summary.tables.data.get_mut(table) {
            state.status = status;
        }
    }
}

/// Decode a row value by its runtime storage class.
fn decode_value(row: &SqliteRow, idx: usize, table_name: &str, column: &Column) -> Result<SqlValue> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }

    let storage = raw.type_info().name().to_uppercase();
    let value = match storage.as_str() {
        "INTEGER" | "INT" | "INT4" | "INT8" | "BIGINT" | "BOOLEAN" => {
            SqlValue::Integer(decode(raw, table_name, column)?)
        }
        "REAL" | "FLOAT" | "DOUBLE" => SqlValue::Real(decode(raw, table_name, column)?),
        "BLOB" => SqlValue::Blob(decode(raw, table_name, column)?),
        _ => SqlValue::Text(decode(raw, table_name, column)?),
    };
    Ok(value)
}

fn decode<'r, T: Decode<'r, sqlx::Sqlite>>(
    raw: SqliteValueRef<'r>,
    table_name: &str,
    column: &Column,
) -> Result<T> {
    T::decode(raw).map_err(|e| {
        MigrateError::transfer(
            table_name,
            format!("failed to decode column {}: {}", column.name, e),
        )
    })
}
