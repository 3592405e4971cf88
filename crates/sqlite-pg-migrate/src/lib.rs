//! # sqlite-pg-migrate
//!
//! SQLite to PostgreSQL migration library.
//!
//! Reads the catalog of a SQLite database file, derives PostgreSQL DDL from
//! it (tables, primary keys, foreign keys, indexes, check constraints),
//! applies that DDL, then bulk-loads every table concurrently using the
//! PostgreSQL COPY protocol, transforming values that have no direct
//! PostgreSQL representation along the way.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlite_pg_migrate::{Config, Migrator, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::new("app.db", "host=localhost user=postgres dbname=app");
//!     let migrator = Migrator::new(config).await?;
//!     let summary = migrator.run().await?;
//!     println!("{}", summary.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod checks;
pub mod config;
pub mod ddl;
pub mod error;
pub mod loader;
pub mod orchestrator;
pub mod summary;
pub mod target;
pub mod transform;
pub mod typemap;

// Re-exports for convenient access
pub use catalog::{Column, ForeignKey, Index, IndexColumn, SqliteCatalog, Table};
pub use checks::{CheckExtractor, TextScanExtractor};
pub use config::{Config, MigrateOptions, SourceConfig, TargetConfig};
pub use error::{MigrateError, Result};
pub use orchestrator::Migrator;
pub use summary::{ArtifactState, ArtifactStatus, TransferSummary};
pub use target::PgPool;
pub use transform::{SqlValue, Transformers};
