//! Lyrics reconciliation library - shared modules for both binaries.
//!
//! Pipeline: corpus + catalog → candidates → scoring → matcher → classify
//! → report → reconcile (import) → catalog.

pub mod candidates;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod confirm;
pub mod corpus;
pub mod error;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod reconcile;
pub mod safety;
pub mod scoring;

pub use config::MatchConfig;
pub use error::{ApplyError, ReconcileError};
pub use models::{MatchResult, ReconciliationStats, Report};

use catalog::CatalogStore;
use corpus::LoadedCorpus;

/// Match a loaded corpus against a catalog and build the tiered report.
pub fn build_report<S: CatalogStore>(
    corpus: &LoadedCorpus,
    store: &S,
    config: &MatchConfig,
) -> error::Result<Report> {
    let entities = store.list_entities()?;
    let snapshot = matcher::CatalogSnapshot::new(&entities);
    let batch = matcher::match_all(&corpus.entries, &snapshot, config);

    let mut report = classify::classify(batch.results, config);
    report.metadata.duplicate_titles = snapshot.duplicate_titles.len();
    report.needs_review = batch.needs_review;
    Ok(report)
}
