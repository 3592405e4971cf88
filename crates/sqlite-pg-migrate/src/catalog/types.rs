//! Schema and metadata types.

use serde::{Deserialize, Serialize};

/// Table metadata, read once from the source catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Column definitions, in catalog ordinal order.
    pub columns: Vec<Column>,

    /// Primary key column names. A table with no declared primary key
    /// reports `["rowid"]` here together with `uses_rowid = true`.
    pub primary_key: Vec<String>,

    /// Whether the table is keyed by SQLite's implicit rowid rather than
    /// a declared primary key.
    pub uses_rowid: bool,

    /// Foreign key constraints.
    pub foreign_keys: Vec<ForeignKey>,

    /// Secondary indexes.
    pub indexes: Vec<Index>,

    /// Raw CREATE TABLE text from sqlite_master.
    pub definition: String,

    /// Row count at catalog-read time.
    pub row_count: i64,
}

impl Table {
    /// Whether the table carries a declared (non-rowid) primary key.
    pub fn has_explicit_pk(&self) -> bool {
        !self.primary_key.is_empty() && !self.uses_rowid
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type string (e.g. "INTEGER", "NVARCHAR(20)", "BOOLEAN").
    pub data_type: String,

    /// Whether the column carries a NOT NULL constraint.
    pub not_null: bool,

    /// Default value expression text, if any.
    pub default_value: Option<String>,

    /// Ordinal position (0-based, from the catalog).
    pub ordinal_pos: i64,
}

/// Foreign key metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Local column name.
    pub column: String,

    /// Referenced table name.
    pub ref_table: String,

    /// Referenced column name.
    pub ref_column: String,
}

/// Index metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Whether the index enforces uniqueness.
    pub is_unique: bool,

    /// Key columns in index order.
    pub columns: Vec<IndexColumn>,
}

/// One key column of an index.
///
/// `name` is None for entries the catalog cannot resolve to a column
/// (expressions, the implicit rowid); the DDL synthesizer skips those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexColumn {
    /// Column name, if the entry resolves to a real column.
    pub name: Option<String>,

    /// Whether the column is indexed descending.
    pub descending: bool,
}
