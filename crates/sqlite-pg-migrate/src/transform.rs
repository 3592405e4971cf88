//! Row value transformation between SQLite and PostgreSQL representations.

use crate::catalog::Column;
use crate::error::{MigrateError, Result};
use std::collections::HashMap;

/// A row value in transit, covering SQLite's runtime storage classes plus
/// the canonical boolean produced by transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
}

impl SqlValue {
    /// Whether the value is falsy: NULL, zero, empty text, empty blob,
    /// or false.
    pub fn is_falsy(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::Integer(n) => *n == 0,
            SqlValue::Real(n) => *n == 0.0,
            SqlValue::Text(s) => s.is_empty(),
            SqlValue::Blob(b) => b.is_empty(),
            SqlValue::Bool(b) => !b,
        }
    }

    /// Whether the value is the numeral zero (or its boolean twin), which
    /// is falsy but still a valid non-null value.
    fn is_numeric_zero(&self) -> bool {
        matches!(
            self,
            SqlValue::Integer(0) | SqlValue::Bool(false)
        ) || matches!(self, SqlValue::Real(n) if *n == 0.0)
    }
}

/// A per-column value transformer, selected by declared source type.
pub type TransformFn = fn(&Column, SqlValue) -> Result<SqlValue>;

/// Canonicalize a source boolean encoding to TRUE/FALSE.
///
/// A falsy value on a nullable column becomes NULL; on a NOT NULL column
/// it is an invariant violation. A truthy numeric encoding or a
/// case-insensitive "true" text encoding maps to TRUE, anything else to
/// FALSE.
pub fn boolean_transform(column: &Column, value: SqlValue) -> Result<SqlValue> {
    if value.is_falsy() {
        if column.not_null {
            return Err(MigrateError::invariant(
                &column.name,
                "value is empty but column is not nullable",
            ));
        }
        return Ok(SqlValue::Null);
    }

    let truthy = match &value {
        SqlValue::Integer(n) => *n != 0,
        SqlValue::Real(n) => *n != 0.0,
        SqlValue::Text(s) => s.eq_ignore_ascii_case("true"),
        SqlValue::Bool(b) => *b,
        _ => false,
    };
    Ok(SqlValue::Bool(truthy))
}

/// Generic empty-coercion for nullable columns, applied after any
/// type-specific transformer: a falsy value that is not the numeral zero
/// becomes an explicit NULL. Zero is a valid non-null value and is
/// preserved.
pub fn coerce_empty(value: SqlValue) -> SqlValue {
    if value.is_falsy() && !value.is_numeric_zero() {
        SqlValue::Null
    } else {
        value
    }
}

/// Registry mapping declared source type tags to transformer functions.
///
/// The mapping is closed and built once at startup; types with no entry
/// use no transformer (identity), and resolution happens per table rather
/// than per row.
pub struct Transformers {
    by_type: HashMap<&'static str, TransformFn>,
}

impl Transformers {
    pub fn new() -> Self {
        let mut by_type: HashMap<&'static str, TransformFn> = HashMap::new();
        by_type.insert("BOOLEAN", boolean_transform);
        Self { by_type }
    }

    /// Look up the transformer for a declared column type.
    pub fn resolve(&self, data_type: &str) -> Option<TransformFn> {
        self.by_type.get(data_type.to_uppercase().as_str()).copied()
    }

    /// Resolve transformers for every column of a table, in ordinal order.
    pub fn plan(&self, columns: &[Column]) -> Vec<Option<TransformFn>> {
        columns.iter().map(|c| self.resolve(&c.data_type)).collect()
    }
}

impl Default for Transformers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bool_column(not_null: bool) -> Column {
        Column {
            name: "active".to_string(),
            data_type: "BOOLEAN".to_string(),
            not_null,
            default_value: None,
            ordinal_pos: 0,
        }
    }

    #[test]
    fn test_falsy_on_nullable_becomes_null() {
        let col = bool_column(false);
        assert_eq!(
            boolean_transform(&col, SqlValue::Integer(0)).unwrap(),
            SqlValue::Null
        );
        assert_eq!(
            boolean_transform(&col, SqlValue::Text(String::new())).unwrap(),
            SqlValue::Null
        );
        assert_eq!(
            boolean_transform(&col, SqlValue::Null).unwrap(),
            SqlValue::Null
        );
    }

    #[test]
    fn test_falsy_on_required_column_is_invariant_violation() {
        let col = bool_column(true);
        assert!(matches!(
            boolean_transform(&col, SqlValue::Integer(0)),
            Err(MigrateError::Invariant { .. })
        ));
        assert!(matches!(
            boolean_transform(&col, SqlValue::Null),
            Err(MigrateError::Invariant { .. })
        ));
    }

    #[test]
    fn test_truthy_encodings() {
        let col = bool_column(true);
        assert_eq!(
            boolean_transform(&col, SqlValue::Integer(1)).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(
            boolean_transform(&col, SqlValue::Text("true".to_string())).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(
            boolean_transform(&col, SqlValue::Text("TRUE".to_string())).unwrap(),
            SqlValue::Bool(true)
        );
        // Non-"true" text is a usable value that reads as FALSE.
        assert_eq!(
            boolean_transform(&col, SqlValue::Text("yes".to_string())).unwrap(),
            SqlValue::Bool(false)
        );
    }

    #[test]
    fn test_coerce_empty_preserves_numeric_zero() {
        assert_eq!(coerce_empty(SqlValue::Integer(0)), SqlValue::Integer(0));
        assert_eq!(coerce_empty(SqlValue::Real(0.0)), SqlValue::Real(0.0));
        assert_eq!(coerce_empty(SqlValue::Bool(false)), SqlValue::Bool(false));
    }

    #[test]
    fn test_coerce_empty_nulls_empty_text_and_blob() {
        assert_eq!(coerce_empty(SqlValue::Text(String::new())), SqlValue::Null);
        assert_eq!(coerce_empty(SqlValue::Blob(Vec::new())), SqlValue::Null);
        assert_eq!(coerce_empty(SqlValue::Null), SqlValue::Null);
    }

    #[test]
    fn test_coerce_empty_keeps_truthy_values() {
        assert_eq!(
            coerce_empty(SqlValue::Text("x".to_string())),
            SqlValue::Text("x".to_string())
        );
        assert_eq!(coerce_empty(SqlValue::Integer(7)), SqlValue::Integer(7));
    }

    #[test]
    fn test_registry_resolution() {
        let transformers = Transformers::new();
        assert!(transformers.resolve("BOOLEAN").is_some());
        assert!(transformers.resolve("boolean").is_some());
        assert!(transformers.resolve("INTEGER").is_none());

        let plan = transformers.plan(&[bool_column(false), {
            let mut c = bool_column(false);
            c.data_type = "TEXT".to_string();
            c
        }]);
        assert!(plan[0].is_some());
        assert!(plan[1].is_none());
    }
}
