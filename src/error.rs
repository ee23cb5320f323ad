//! Error types for the reconciliation library.
//!
//! Normalization and scoring never fail; only corpus/report I/O and catalog
//! store access produce these.

use thiserror::Error;

use crate::models::ReconciliationStats;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Catalog store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed corpus entry '{title}': {reason}")]
    MalformedInput { title: String, reason: String },

    #[error("Invalid SQL identifier: {0}")]
    InvalidIdentifier(String),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// A store failure that ended an import pass part-way.
///
/// Writes made before the failure are not rolled back; `stats` reports how
/// far the pass got.
#[derive(Error, Debug)]
#[error("import pass aborted after {} writes: {source}", .stats.imported)]
pub struct ApplyError {
    pub stats: ReconciliationStats,
    #[source]
    pub source: ReconcileError,
}
