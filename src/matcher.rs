//! Matcher: best catalog title for each corpus entry.
//!
//! Every candidate of an entry is scored against every catalog title; the
//! first strictly-best pair wins. Entries are independent of each other, so
//! the batch runs on the rayon pool.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::candidates::{extract_candidates, is_irregular_title, url_slug};
use crate::config::MatchConfig;
use crate::models::{CatalogEntity, CorpusEntry, MatchResult, MatchSource};
use crate::normalize::normalize;
use crate::progress::{create_progress_bar, log_progress};
use crate::scoring::score;

// ============================================================================
// Catalog Snapshot
// ============================================================================

/// Catalog titles prepared once per batch.
///
/// `titles` keeps the store's order, which is the tie-breaking order.
/// The title → id lookup keeps the last id seen for a repeated title;
/// repeated titles are recorded in `duplicate_titles` and logged.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub titles: Vec<String>,
    pub normalized: Vec<String>,
    pub ids: FxHashMap<String, String>,
    pub duplicate_titles: Vec<String>,
}

impl CatalogSnapshot {
    pub fn new(entities: &[CatalogEntity]) -> Self {
        let mut ids: FxHashMap<String, String> = FxHashMap::default();
        let mut duplicate_titles = Vec::new();

        for entity in entities {
            if let Some(previous) = ids.insert(entity.title.clone(), entity.id.clone()) {
                if previous != entity.id && !duplicate_titles.contains(&entity.title) {
                    warn!(
                        "Duplicate catalog title '{}' (ids {} and {}); using the last one",
                        entity.title, previous, entity.id
                    );
                    duplicate_titles.push(entity.title.clone());
                }
            }
        }

        Self {
            titles: entities.iter().map(|e| e.title.clone()).collect(),
            normalized: entities.iter().map(|e| normalize(&e.title)).collect(),
            ids,
            duplicate_titles,
        }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn id_for(&self, title: &str) -> Option<&str> {
        self.ids.get(title).map(String::as_str)
    }
}

// ============================================================================
// Single Entry
// ============================================================================

/// Best (catalog index, score, source) over all candidates of one title.
/// None when no pair passes the overlap gate.
fn best_pair(
    corpus_title: &str,
    slug: &str,
    catalog_norm: &[String],
    config: &MatchConfig,
) -> Option<(usize, f64, MatchSource)> {
    let mut best: Option<(usize, f64, MatchSource)> = None;
    let mut best_score = 0.0;

    for candidate in extract_candidates(corpus_title, slug) {
        let candidate_norm = normalize(&candidate.text);
        for (idx, title_norm) in catalog_norm.iter().enumerate() {
            let s = score(&candidate_norm, title_norm, config);
            // Strictly greater: the earlier pair keeps ties
            if s > best_score {
                best_score = s;
                best = Some((idx, s, candidate.source));
            }
        }
    }

    best
}

/// Match one corpus entry against the catalog snapshot.
pub fn match_one(
    corpus_title: &str,
    slug: &str,
    catalog: &CatalogSnapshot,
    config: &MatchConfig,
) -> MatchResult {
    match best_pair(corpus_title, slug, &catalog.normalized, config) {
        Some((idx, confidence, source)) => {
            let title = &catalog.titles[idx];
            MatchResult {
                lyric_title: corpus_title.to_string(),
                url_slug: slug.to_string(),
                matched_db_title: Some(title.clone()),
                confidence,
                match_source: Some(source),
                song_id: catalog.id_for(title).map(str::to_string),
            }
        }
        None => MatchResult::unmatched(corpus_title, slug),
    }
}

/// Match against a plain list of catalog titles, without ids.
/// Returns (title, confidence, source) of the best pair.
pub fn best_title_match(
    corpus_title: &str,
    slug: &str,
    catalog_titles: &[String],
    config: &MatchConfig,
) -> Option<(String, f64, MatchSource)> {
    let normalized: Vec<String> = catalog_titles.iter().map(|t| normalize(t)).collect();
    best_pair(corpus_title, slug, &normalized, config)
        .map(|(idx, s, source)| (catalog_titles[idx].clone(), s, source))
}

// ============================================================================
// Batch
// ============================================================================

/// Output of a batch match: one result per corpus entry, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchMatch {
    pub results: Vec<MatchResult>,
    /// Titles whose parentheses did not fit `main(subtitle)`.
    pub needs_review: Vec<String>,
}

/// Match every corpus entry. Results keep the order of `entries`.
pub fn match_all(
    entries: &[CorpusEntry],
    catalog: &CatalogSnapshot,
    config: &MatchConfig,
) -> BatchMatch {
    let total = entries.len() as u64;
    let pb = create_progress_bar(total, "Matching corpus titles");
    let done = std::sync::atomic::AtomicU64::new(0);

    let results: Vec<MatchResult> = entries
        .par_iter()
        .map(|entry| {
            let slug = url_slug(&entry.url, &config.slug_marker);
            let result = match_one(&entry.title, slug, catalog, config);
            pb.inc(1);
            let current = done.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
            log_progress("match", current, total, 500);
            result
        })
        .collect();

    pb.finish_with_message(format!("Matched {} corpus titles", results.len()));

    let needs_review: Vec<String> = entries
        .iter()
        .filter(|e| is_irregular_title(&e.title))
        .map(|e| {
            debug!("Title does not fit main(subtitle), matched whole: '{}'", e.title);
            e.title.clone()
        })
        .collect();

    BatchMatch {
        results,
        needs_review,
    }
}
