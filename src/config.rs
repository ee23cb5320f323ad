//! Engine tunables: stoplist, tier thresholds and overlap-gate limits.
//!
//! Command-line parsing lives in the binaries; they build a `MatchConfig`
//! from their arguments and hand it to the library.

use rustc_hash::FxHashSet;

use crate::candidates::DEFAULT_SLUG_MARKER;

// ============================================================================
// Defaults
// ============================================================================

/// Greek function words ignored by the overlap gate
/// (and, if, for, to, with, at the, of the, the).
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "και", "αν", "για", "να", "με", "στο", "της", "του", "η", "ο",
];

/// Minimum confidence for automatic import
pub const CERTAIN_THRESHOLD: f64 = 0.85;

/// Minimum confidence for operator confirmation
pub const UNCERTAIN_THRESHOLD: f64 = 0.70;

/// Titles shorter than this (in characters) need a stronger token overlap
pub const SHORT_TITLE_CHARS: usize = 15;

/// Characters shared tokens must cover on short titles
pub const MIN_SHORT_OVERLAP_CHARS: usize = 3;

/// Matching configuration shared by the scorer, matcher and classifier.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub stopwords: FxHashSet<String>,
    pub certain_threshold: f64,
    pub uncertain_threshold: f64,
    pub short_title_chars: usize,
    pub min_short_overlap_chars: usize,
    pub slug_marker: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            certain_threshold: CERTAIN_THRESHOLD,
            uncertain_threshold: UNCERTAIN_THRESHOLD,
            short_title_chars: SHORT_TITLE_CHARS,
            min_short_overlap_chars: MIN_SHORT_OVERLAP_CHARS,
            slug_marker: DEFAULT_SLUG_MARKER.to_string(),
        }
    }
}

impl MatchConfig {
    /// Replace the stoplist from a comma-separated list.
    /// Words are normalized so they compare against normalized titles.
    pub fn with_stopwords(mut self, list: &str) -> Self {
        self.stopwords = parse_stopwords(list);
        self
    }

    pub fn with_slug_marker(mut self, marker: impl Into<String>) -> Self {
        self.slug_marker = marker.into();
        self
    }
}

/// Parse a comma-separated stoplist (e.g. "και, να,με").
/// Empty items are dropped.
pub fn parse_stopwords(list: &str) -> FxHashSet<String> {
    list.split(',')
        .map(crate::normalize::normalize)
        .filter(|w| !w.is_empty())
        .collect()
}
