//! Type mapping between SQLite declared types and PostgreSQL.

/// Map a SQLite declared column type to PostgreSQL. First match wins;
/// types matching no rule pass through verbatim and PostgreSQL rejects
/// any truly invalid ones at DDL-apply time.
pub fn remap_column_type(column_type: &str) -> String {
    if column_type.contains("STRING") {
        "TEXT".to_string()
    } else if column_type.contains("NVARCHAR") {
        // Keep any length qualifier: NVARCHAR(20) -> VARCHAR(20)
        column_type.replace("NVARCHAR", "VARCHAR")
    } else if column_type.contains("DATETIME") {
        "TIMESTAMP".to_string()
    } else if column_type.contains("BLOB") {
        "BYTEA".to_string()
    } else {
        column_type.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_types() {
        assert_eq!(remap_column_type("STRING"), "TEXT");
        assert_eq!(remap_column_type("NVARCHAR(20)"), "VARCHAR(20)");
        assert_eq!(remap_column_type("NVARCHAR"), "VARCHAR");
    }

    #[test]
    fn test_datetime_types() {
        assert_eq!(remap_column_type("DATETIME"), "TIMESTAMP");
    }

    #[test]
    fn test_blob_types() {
        assert_eq!(remap_column_type("BLOB"), "BYTEA");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(remap_column_type("INTEGER"), "INTEGER");
        assert_eq!(remap_column_type("REAL"), "REAL");
        assert_eq!(remap_column_type("NUMERIC(10,2)"), "NUMERIC(10,2)");
        assert_eq!(remap_column_type("BOOLEAN"), "BOOLEAN");
        assert_eq!(remap_column_type(""), "");
    }

    #[test]
    fn test_passthrough_is_idempotent() {
        for t in ["TEXT", "VARCHAR(20)", "TIMESTAMP", "BYTEA"] {
            assert_eq!(remap_column_type(t), t);
        }
    }
}
