//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (missing fields, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A DDL statement could not be synthesized from the source catalog.
    #[error("Schema translation failed: {0}")]
    SchemaTranslation(String),

    /// A row value violated a declared constraint after transformation.
    #[error("Invariant violation in column {column}: {message}")]
    Invariant { column: String, message: String },

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] sqlx::Error),

    /// Target database connection or query error
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// Connection pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Data transfer failed for a specific table
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create an Invariant error for a column.
    pub fn invariant(column: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Invariant {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a Transfer error.
    pub fn transfer(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Transfer {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
