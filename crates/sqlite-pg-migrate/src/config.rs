//! Configuration types passed into the orchestrator.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (SQLite file).
    pub source: SourceConfig,

    /// Target database configuration (PostgreSQL).
    pub target: TargetConfig,

    /// Migration behavior options.
    #[serde(default)]
    pub options: MigrateOptions,
}

impl Config {
    /// Create a configuration with default options.
    pub fn new(sqlite_path: impl Into<String>, pg_conninfo: impl Into<String>) -> Self {
        Self {
            source: SourceConfig {
                path: sqlite_path.into(),
            },
            target: TargetConfig {
                conninfo: pg_conninfo.into(),
            },
            options: MigrateOptions::default(),
        }
    }

    /// Replace the default options.
    pub fn with_options(mut self, options: MigrateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Source database (SQLite) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the SQLite database file.
    pub path: String,
}

impl SourceConfig {
    /// Build a connection URL for sqlx.
    pub fn connection_url(&self) -> String {
        format!("sqlite://{}?mode=ro", self.path)
    }
}

/// Target database (PostgreSQL) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// libpq-style connection string (host=... user=... dbname=...)
    /// or a postgres:// URL.
    pub conninfo: String,
}

/// Migration behavior options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateOptions {
    /// Emit extracted CHECK clauses into CREATE TABLE statements
    /// (default: false — checks are extracted and counted but not applied).
    #[serde(default)]
    pub emit_checks: bool,

    /// Acknowledge source views in the summary (they are never translated).
    #[serde(default)]
    pub migrate_views: bool,

    /// Acknowledge source triggers in the summary (they are never translated).
    #[serde(default)]
    pub migrate_triggers: bool,

    /// Drop target tables sharing a name with a source table before import.
    #[serde(default)]
    pub drop_existing: bool,

    /// Drop all migrated tables after the import completes.
    #[serde(default)]
    pub drop_after_import: bool,

    /// Log up to 10 rows of each migrated table after the load phase.
    #[serde(default)]
    pub show_sample_data: bool,

    /// Maximum simultaneous PostgreSQL connections. One COPY runs per
    /// connection, so this bounds concurrent table loads.
    #[serde(default = "default_pg_connections")]
    pub max_pg_connections: usize,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            emit_checks: false,
            migrate_views: false,
            migrate_triggers: false,
            drop_existing: false,
            drop_after_import: false,
            show_sample_data: false,
            max_pg_connections: default_pg_connections(),
        }
    }
}

fn default_pg_connections() -> usize {
    16
}
