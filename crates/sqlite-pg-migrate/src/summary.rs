//! Structured per-table, per-artifact status report for a migration run.

use crate::error::Result;
use serde::ser::Serializer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Status of one migrated artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactStatus {
    /// Synthesized from the catalog, not yet applied.
    Prepared,
    /// Applied to the target.
    Created,
    /// Acknowledged but intentionally not applied.
    Ignored,
    /// Rows loaded so far (running, then final, count).
    Loaded(i64),
    /// The artifact's phase failed.
    Failed(String),
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactStatus::Prepared => write!(f, "PREPARED"),
            ArtifactStatus::Created => write!(f, "CREATED"),
            ArtifactStatus::Ignored => write!(f, "IGNORED"),
            ArtifactStatus::Loaded(n) => write!(f, "LOADED {}", n),
            ArtifactStatus::Failed(msg) => write!(f, "FAILED: {}", msg),
        }
    }
}

impl Serialize for ArtifactStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Status and element count for one table's artifact of one kind.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactState {
    pub status: ArtifactStatus,
    pub count: i64,
}

impl ArtifactState {
    pub fn prepared(count: i64) -> Self {
        Self {
            status: ArtifactStatus::Prepared,
            count,
        }
    }

    pub fn ignored(count: i64) -> Self {
        Self {
            status: ArtifactStatus::Ignored,
            count,
        }
    }
}

/// Per-kind status maps for table artifacts, keyed by table name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableArtifacts {
    pub columns: BTreeMap<String, ArtifactState>,
    pub pks: BTreeMap<String, ArtifactState>,
    pub fks: BTreeMap<String, ArtifactState>,
    pub checks: BTreeMap<String, ArtifactState>,
    pub data: BTreeMap<String, ArtifactState>,
    pub indexes: BTreeMap<String, ArtifactState>,
}

/// Structured status report for a whole run. Created empty at run start;
/// each component mutates only its own category as it completes work, and
/// entries are never removed mid-run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferSummary {
    pub tables: TableArtifacts,
    pub views: BTreeMap<String, ArtifactState>,
    pub triggers: BTreeMap<String, ArtifactState>,
}

impl TransferSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the summary as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total rows reported loaded across all tables.
    pub fn rows_loaded(&self) -> i64 {
        self.tables
            .data
            .values()
            .map(|state| match state.status {
                ArtifactStatus::Loaded(n) => n,
                _ => 0,
            })
            .sum()
    }
}
