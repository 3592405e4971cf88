//! PostgreSQL target database operations.

use crate::catalog::Table;
use crate::config::TargetConfig;
use crate::ddl::quote_ident;
use crate::error::{MigrateError, Result};
use crate::transform::SqlValue;
use bytes::{BufMut, BytesMut};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::{debug, info};

/// PostgreSQL target pool.
///
/// The bulk loader takes one pooled connection per table task, so the pool
/// size bounds how many COPYs run at once.
pub struct PgPool {
    pool: Pool,
}

impl PgPool {
    /// Create a pool from a libpq-style connection string or postgres:// URL.
    pub async fn connect(config: &TargetConfig, max_conns: usize) -> Result<Self> {
        let pg_config = config.conninfo.parse::<PgConfig>()?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(max_conns)
            .build()
            .map_err(|e| MigrateError::Pool(format!("Failed to create pool: {}", e)))?;

        // Test connection
        let client = pool
            .get()
            .await
            .map_err(|e| MigrateError::Pool(format!("Failed to get connection: {}", e)))?;
        client.simple_query("SELECT 1").await?;

        info!("Connected to PostgreSQL target");
        Ok(Self { pool })
    }

    /// Get a pooled connection, dedicated to the caller until dropped.
    pub async fn get(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::Pool(format!("Failed to get connection: {}", e)))
    }

    /// Apply a sequence of DDL statements inside one transaction. Any one
    /// failure aborts the whole batch.
    pub async fn apply_ddl(&self, statements: &[String]) -> Result<()> {
        if statements.is_empty() {
            return Ok(());
        }

        let mut client = self.get().await?;
        let tx = client.transaction().await?;

        for sql in statements {
            debug!("Running SQL:\n{}", sql);
            tx.batch_execute(sql).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Drop a table and everything depending on it.
    pub async fn drop_table(&self, table: &str) -> Result<()> {
        let client = self.get().await?;
        let sql = format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(table));
        client.batch_execute(&sql).await?;

        debug!("Dropped table {}", table);
        Ok(())
    }

    /// Fetch up to `limit` rows of a table, rendered as text, for the
    /// sample-data preview.
    pub async fn sample_rows(&self, table: &str, limit: i64) -> Result<Vec<String>> {
        let client = self.get().await?;
        let sql = format!(
            "SELECT (t.*)::text FROM {} t LIMIT {}",
            quote_ident(table),
            limit
        );
        let rows = client.query(sql.as_str(), &[]).await?;

        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }
}

/// Build the COPY statement for a table, columns in ordinal order.
pub fn copy_statement(table: &Table) -> String {
    let cols: Vec<String> = table
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect();
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT text)",
        quote_ident(&table.name),
        cols.join(", ")
    )
}

/// Append one row to a COPY text buffer as a tab-separated line.
pub fn encode_row(buf: &mut BytesMut, row: &[SqlValue]) {
    for (idx, value) in row.iter().enumerate() {
        if idx > 0 {
            buf.put_u8(b'\t');
        }
        buf.extend_from_slice(copy_text(value).as_bytes());
    }
    buf.put_u8(b'\n');
}

/// Convert a value to COPY text format.
fn copy_text(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "\\N".to_string(),
        SqlValue::Integer(n) => n.to_string(),
        SqlValue::Real(n) => n.to_string(),
        SqlValue::Text(s) => escape_copy_text(s),
        SqlValue::Blob(b) => format!("\\\\x{}", hex::encode(b)),
        SqlValue::Bool(b) => if *b { "t" } else { "f" }.to_string(),
    }
}

/// Escape special characters for COPY text format.
fn escape_copy_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\t' => result.push_str("\\t"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Column;

    #[test]
    fn test_copy_text_values() {
        assert_eq!(copy_text(&SqlValue::Null), "\\N");
        assert_eq!(copy_text(&SqlValue::Integer(0)), "0");
        assert_eq!(copy_text(&SqlValue::Integer(-7)), "-7");
        assert_eq!(copy_text(&SqlValue::Bool(true)), "t");
        assert_eq!(copy_text(&SqlValue::Bool(false)), "f");
        assert_eq!(copy_text(&SqlValue::Blob(vec![0xde, 0xad])), "\\\\xdead");
    }

    #[test]
    fn test_copy_text_escapes_control_characters() {
        assert_eq!(
            copy_text(&SqlValue::Text("a\tb\nc\\d".to_string())),
            "a\\tb\\nc\\\\d"
        );
    }

    #[test]
    fn test_encode_row() {
        let mut buf = BytesMut::new();
        encode_row(
            &mut buf,
            &[
                SqlValue::Integer(1),
                SqlValue::Bool(true),
                SqlValue::Null,
            ],
        );
        assert_eq!(&buf[..], b"1\tt\t\\N\n");
    }

    #[test]
    fn test_copy_statement_lists_columns_in_order() {
        let table = Table {
            name: "Users".to_string(),
            columns: vec![
                Column {
                    name: "id".to_string(),
                    data_type: "INTEGER".to_string(),
                    not_null: false,
                    default_value: None,
                    ordinal_pos: 0,
                },
                Column {
                    name: "active".to_string(),
                    data_type: "BOOLEAN".to_string(),
                    not_null: true,
                    default_value: None,
                    ordinal_pos: 1,
                },
            ],
            primary_key: vec!["id".to_string()],
            uses_rowid: false,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            definition: String::new(),
            row_count: 0,
        };

        assert_eq!(
            copy_statement(&table),
            "COPY \"Users\" (\"id\", \"active\") FROM STDIN WITH (FORMAT text)"
        );
    }
}
