//! SQLite source catalog operations.

mod types;

pub use types::*;

use crate::config::SourceConfig;
use crate::ddl::quote_ident;
use crate::error::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};

/// Reader over a SQLite database's catalog.
///
/// Tables are enumerated in sqlite_master order; internal `sqlite_*`
/// bookkeeping tables are excluded.
pub struct SqliteCatalog {
    pool: SqlitePool,
}

/// Escape a string for use inside a single-quoted SQL literal.
fn quote_str(s: &str) -> String {
    s.replace('\'', "''")
}

impl SqliteCatalog {
    /// Open the source database read-only.
    pub async fn connect(config: &SourceConfig, max_connections: usize) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections as u32)
            .connect(&config.connection_url())
            .await?;

        info!("Opened SQLite database: {}", config.path);
        Ok(Self { pool })
    }

    /// Wrap an already-open pool (embedding callers, in-memory databases).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool, for row cursors.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read every user table with its full metadata.
    pub async fn read_tables(&self) -> Result<Vec<Table>> {
        let rows = sqlx::query(
            "SELECT name, sql FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let mut table = Table {
                name: row.try_get("name")?,
                columns: Vec::new(),
                primary_key: Vec::new(),
                uses_rowid: false,
                foreign_keys: Vec::new(),
                indexes: Vec::new(),
                definition: row.try_get::<Option<String>, _>("sql")?.unwrap_or_default(),
                row_count: 0,
            };

            self.load_columns(&mut table).await?;
            self.load_foreign_keys(&mut table).await?;
            self.load_indexes(&mut table).await?;
            self.load_row_count(&mut table).await?;

            tables.push(table);
        }

        info!("Read {} tables from source catalog", tables.len());
        Ok(tables)
    }

    /// Load columns and the primary key from `PRAGMA table_info`.
    async fn load_columns(&self, table: &mut Table) -> Result<()> {
        let rows = sqlx::query(&format!(
            "PRAGMA table_info('{}')",
            quote_str(&table.name)
        ))
        .fetch_all(&self.pool)
        .await?;

        // (position within the PK, column name)
        let mut pk_cols: Vec<(i64, String)> = Vec::new();

        for row in rows {
            let col = Column {
                name: row.try_get("name")?,
                data_type: row.try_get("type")?,
                not_null: row.try_get::<i64, _>("notnull")? != 0,
                default_value: row.try_get("dflt_value")?,
                ordinal_pos: row.try_get("cid")?,
            };

            let pk_ord: i64 = row.try_get("pk")?;
            if pk_ord > 0 {
                pk_cols.push((pk_ord, col.name.clone()));
            }

            table.columns.push(col);
        }
        table.columns.sort_by_key(|c| c.ordinal_pos);

        pk_cols.sort_by_key(|(ord, _)| *ord);
        table.primary_key = pk_cols.into_iter().map(|(_, name)| name).collect();

        // The source catalog reports ["rowid"] for tables keyed by the
        // implicit rowid; the flag is what downstream consumers honor.
        if table.primary_key.is_empty() {
            table.uses_rowid = true;
            table.primary_key = vec!["rowid".to_string()];
        }

        debug!("Loaded {} columns for {}", table.columns.len(), table.name);
        Ok(())
    }

    /// Load foreign keys from `PRAGMA foreign_key_list`.
    async fn load_foreign_keys(&self, table: &mut Table) -> Result<()> {
        let rows = sqlx::query(&format!(
            "PRAGMA foreign_key_list('{}')",
            quote_str(&table.name)
        ))
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let ref_table: String = row.try_get("table")?;

            // `to` is NULL when the constraint references the other table's
            // implicit primary key.
            let ref_column = match row.try_get::<Option<String>, _>("to")? {
                Some(col) => col,
                None => self.declared_pk(&ref_table).await?,
            };

            table.foreign_keys.push(ForeignKey {
                column: row.try_get("from")?,
                ref_table,
                ref_column,
            });
        }

        debug!(
            "Loaded {} foreign keys for {}",
            table.foreign_keys.len(),
            table.name
        );
        Ok(())
    }

    /// First declared primary key column of a table, or "rowid".
    async fn declared_pk(&self, table_name: &str) -> Result<String> {
        let rows = sqlx::query(&format!(
            "PRAGMA table_info('{}')",
            quote_str(table_name)
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut pk_cols: Vec<(i64, String)> = Vec::new();
        for row in rows {
            let pk_ord: i64 = row.try_get("pk")?;
            if pk_ord > 0 {
                pk_cols.push((pk_ord, row.try_get("name")?));
            }
        }
        pk_cols.sort_by_key(|(ord, _)| *ord);

        Ok(pk_cols
            .into_iter()
            .map(|(_, name)| name)
            .next()
            .unwrap_or_else(|| "rowid".to_string()))
    }

    /// Load secondary indexes from `PRAGMA index_list` + `index_xinfo`.
    /// The index backing a PRIMARY KEY constraint is not a secondary index
    /// and is skipped.
    async fn load_indexes(&self, table: &mut Table) -> Result<()> {
        let rows = sqlx::query(&format!(
            "PRAGMA index_list('{}')",
            quote_str(&table.name)
        ))
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let origin: String = row.try_get("origin")?;
            if origin == "pk" {
                continue;
            }

            let mut index = Index {
                name: row.try_get("name")?,
                is_unique: row.try_get::<i64, _>("unique")? != 0,
                columns: Vec::new(),
            };

            let col_rows = sqlx::query(&format!(
                "PRAGMA index_xinfo('{}')",
                quote_str(&index.name)
            ))
            .fetch_all(&self.pool)
            .await?;

            for col_row in col_rows {
                // key = 0 marks auxiliary columns (the trailing rowid).
                if col_row.try_get::<i64, _>("key")? == 0 {
                    continue;
                }
                index.columns.push(IndexColumn {
                    name: col_row.try_get("name")?,
                    descending: col_row.try_get::<i64, _>("desc")? != 0,
                });
            }

            table.indexes.push(index);
        }

        debug!("Loaded {} indexes for {}", table.indexes.len(), table.name);
        Ok(())
    }

    /// Count the table's rows for progress accounting.
    async fn load_row_count(&self, table: &mut Table) -> Result<()> {
        let row = sqlx::query(&format!(
            "SELECT count(*) AS n FROM {}",
            quote_ident(&table.name)
        ))
        .fetch_one(&self.pool)
        .await?;

        table.row_count = row.try_get("n")?;
        Ok(())
    }

    /// Names of views in the source database.
    pub async fn view_names(&self) -> Result<Vec<String>> {
        self.object_names("view").await
    }

    /// Names of triggers in the source database.
    pub async fn trigger_names(&self) -> Result<Vec<String>> {
        self.object_names("trigger").await
    }

    async fn object_names(&self, kind: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(&format!(
            "SELECT name FROM sqlite_master WHERE type = '{}'",
            kind
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.try_get("name").map_err(Into::into))
            .collect()
    }
}
