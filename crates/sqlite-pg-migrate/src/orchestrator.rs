//! Migration orchestrator - main workflow coordinator.

use crate::catalog::{SqliteCatalog, Table};
use crate::checks::{CheckExtractor, TextScanExtractor};
use crate::config::Config;
use crate::ddl::{build_fk_ddl, build_index_ddl, build_table_ddl};
use crate::error::{MigrateError, Result};
use crate::loader::BulkLoader;
use crate::summary::{ArtifactState, ArtifactStatus, TransferSummary};
use crate::target::PgPool;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Runs a migration end to end: optional drop, schema build, concurrent
/// data load, deferred foreign keys and indexes, summary.
///
/// Phases are strictly sequential; a failure in one phase propagates
/// without rollback, leaving the target in whatever partial state the
/// aborted phase produced.
pub struct Migrator {
    config: Config,
    source: Arc<SqliteCatalog>,
    target: Arc<PgPool>,
    checks: Box<dyn CheckExtractor + Send + Sync>,
    summary: Arc<Mutex<TransferSummary>>,
}

impl Migrator {
    /// Connect to both engines and create an orchestrator.
    pub async fn new(config: Config) -> Result<Self> {
        let max_conns = config.options.max_pg_connections;
        let source = SqliteCatalog::connect(&config.source, max_conns).await?;
        let target = PgPool::connect(&config.target, max_conns).await?;

        Ok(Self {
            config,
            source: Arc::new(source),
            target: Arc::new(target),
            checks: Box::new(TextScanExtractor),
            summary: Arc::new(Mutex::new(TransferSummary::new())),
        })
    }

    /// Replace the default text-scan check extractor.
    pub fn with_check_extractor(
        mut self,
        extractor: Box<dyn CheckExtractor + Send + Sync>,
    ) -> Self {
        self.checks = extractor;
        self
    }

    /// Snapshot of the transfer summary. After a failed run this shows
    /// exactly which tables and artifacts reached which status.
    pub fn summary(&self) -> TransferSummary {
        self.summary.lock().unwrap().clone()
    }

    /// Run the migration.
    pub async fn run(&self) -> Result<TransferSummary> {
        info!("Phase 1: Reading source catalog");
        let tables = self.source.read_tables().await?;

        if self.config.options.drop_existing {
            info!("Dropping pre-existing target tables");
            for table in &tables {
                self.target.drop_table(&table.name).await?;
            }
        }

        info!("Phase 2: Building target schema for {} tables", tables.len());
        let (create_sql, fk_sql, index_sql) = self.build_schema(&tables)?;
        self.target.apply_ddl(&create_sql).await?;
        {
            let mut summary = self.summary.lock().unwrap();
            mark_created(&mut summary.tables.columns);
            mark_created(&mut summary.tables.pks);
            for state in summary.tables.checks.values_mut() {
                if state.status == ArtifactStatus::Prepared {
                    state.status = ArtifactStatus::Created;
                }
            }
        }

        info!("Phase 3: Loading data into {} tables", tables.len());
        self.load_data(&tables).await?;

        info!(
            "Phase 4: Applying {} foreign keys and {} indexes",
            fk_sql.len(),
            index_sql.len()
        );
        let mut finalize_sql = fk_sql;
        finalize_sql.extend(index_sql);
        self.target.apply_ddl(&finalize_sql).await?;
        {
            let mut summary = self.summary.lock().unwrap();
            mark_created(&mut summary.tables.fks);
            mark_created(&mut summary.tables.indexes);
        }

        self.acknowledge_views_and_triggers().await?;

        if self.config.options.show_sample_data {
            self.show_samples(&tables).await?;
        }

        if self.config.options.drop_after_import {
            info!("Dropping migrated tables after import");
            for table in &tables {
                self.target.drop_table(&table.name).await?;
            }
        }

        let summary = self.summary();
        info!(
            "Migration complete: {} tables, {} rows loaded",
            tables.len(),
            summary.rows_loaded()
        );
        Ok(summary)
    }

    /// Synthesize all DDL up front: CREATE TABLEs for phase 2, foreign keys
    /// and indexes deferred to phase 4.
    fn build_schema(&self, tables: &[Table]) -> Result<(Vec<String>, Vec<String>, Vec<String>)> {
        let emit_checks = self.config.options.emit_checks;

        let mut create_sql = Vec::with_capacity(tables.len());
        let mut fk_sql = Vec::new();
        let mut index_sql = Vec::new();

        for table in tables {
            let checks = self.checks.extract(&table.definition);
            create_sql.push(build_table_ddl(table, &checks, emit_checks));
            fk_sql.extend(build_fk_ddl(table));
            index_sql.extend(build_index_ddl(table)?);

            let mut summary = self.summary.lock().unwrap();
            summary.tables.columns.insert(
                table.name.clone(),
                ArtifactState::prepared(table.columns.len() as i64),
            );
            summary.tables.pks.insert(
                table.name.clone(),
                ArtifactState::prepared(table.primary_key.len() as i64),
            );
            let checks_state = if emit_checks && !checks.is_empty() {
                ArtifactState::prepared(checks.len() as i64)
            } else {
                ArtifactState::ignored(checks.len() as i64)
            };
            summary.tables.checks.insert(table.name.clone(), checks_state);
            summary.tables.fks.insert(
                table.name.clone(),
                ArtifactState::prepared(table.foreign_keys.len() as i64),
            );
            summary.tables.indexes.insert(
                table.name.clone(),
                ArtifactState::prepared(table.indexes.len() as i64),
            );
        }

        Ok((create_sql, fk_sql, index_sql))
    }

    /// Load every table concurrently. All tasks are issued together; the
    /// first failure propagates without aborting tasks already running.
    async fn load_data(&self, tables: &[Table]) -> Result<()> {
        {
            let mut summary = self.summary.lock().unwrap();
            for table in tables {
                summary
                    .tables
                    .data
                    .insert(table.name.clone(), ArtifactState::prepared(table.row_count));
            }
        }

        let loader = Arc::new(BulkLoader::new(
            self.source.clone(),
            self.target.clone(),
            self.summary.clone(),
        ));

        let handles: Vec<_> = tables
            .iter()
            .cloned()
            .map(|table| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load_table(&table).await })
            })
            .collect();

        try_join_all(handles.into_iter().map(|handle| async move {
            handle.await.map_err(|e| {
                MigrateError::transfer("data load", format!("load task panicked: {}", e))
            })?
        }))
        .await?;

        Ok(())
    }

    /// Record source views and triggers in the summary. They are
    /// acknowledged but never translated.
    async fn acknowledge_views_and_triggers(&self) -> Result<()> {
        if self.config.options.migrate_views {
            for name in self.source.view_names().await? {
                debug!("Source view {} is not translated", name);
                self.summary
                    .lock()
                    .unwrap()
                    .views
                    .insert(name, ArtifactState::ignored(0));
            }
        }

        if self.config.options.migrate_triggers {
            for name in self.source.trigger_names().await? {
                debug!("Source trigger {} is not translated", name);
                self.summary
                    .lock()
                    .unwrap()
                    .triggers
                    .insert(name, ArtifactState::ignored(0));
            }
        }

        Ok(())
    }

    /// Log up to 10 rows of each migrated table.
    async fn show_samples(&self, tables: &[Table]) -> Result<()> {
        for table in tables {
            debug!("Data in {}", table.name);
            for line in self.target.sample_rows(&table.name, 10).await? {
                debug!("  {}", line);
            }
        }
        Ok(())
    }
}

fn mark_created(map: &mut BTreeMap<String, ArtifactState>) {
    for state in map.values_mut() {
        state.status = ArtifactStatus::Created;
    }
}
