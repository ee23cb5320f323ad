//! Core data models for lyrics reconciliation.
//!
//! This module contains the struct definitions and enums shared by the
//! matching, classification and import stages, including the serialized
//! shape of the match report.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Corpus payloads keyed by raw corpus title.
pub type PayloadIndex = FxHashMap<String, LyricsPayload>;

// ============================================================================
// Corpus Models
// ============================================================================

/// Payload attached to one scraped corpus entry.
/// Keys other than `lyrics` are kept untouched in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LyricsPayload {
    pub lyrics: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One title → lyrics record from the corpus file.
#[derive(Clone, Debug, PartialEq)]
pub struct CorpusEntry {
    pub title: String,
    pub url: String,
    pub payload: LyricsPayload,
}

// ============================================================================
// Catalog Models
// ============================================================================

/// Authoritative catalog record. `id` is opaque, `title` is read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntity {
    pub id: String,
    pub title: String,
}

// ============================================================================
// Candidates
// ============================================================================

/// Which part of a corpus entry produced the winning comparison string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Main,
    Subtitle,
    Slug,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchSource::Main => "main",
            MatchSource::Subtitle => "subtitle",
            MatchSource::Slug => "slug",
        }
    }
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparison string derived from a corpus title. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub source: MatchSource,
}

impl Candidate {
    pub fn new(text: impl Into<String>, source: MatchSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

// ============================================================================
// Match Results
// ============================================================================

/// Best match found for one corpus entry.
///
/// Serialized with the report's field names. `confidence` is written rounded
/// to three decimals but kept unrounded in memory for tiering and sorting.
///
/// ## Key Invariants
///
/// - `confidence == 0.0` whenever `matched_db_title` is `None`
/// - `match_source` is `None` (written as `""`) whenever nothing matched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub lyric_title: String,
    pub url_slug: String,
    pub matched_db_title: Option<String>,
    #[serde(serialize_with = "serialize_confidence")]
    pub confidence: f64,
    #[serde(with = "match_source_field")]
    pub match_source: Option<MatchSource>,
    #[serde(default, deserialize_with = "deserialize_song_id")]
    pub song_id: Option<String>,
}

impl MatchResult {
    /// Result for an entry where no candidate passed the overlap gate.
    pub fn unmatched(lyric_title: impl Into<String>, url_slug: impl Into<String>) -> Self {
        Self {
            lyric_title: lyric_title.into(),
            url_slug: url_slug.into(),
            matched_db_title: None,
            confidence: 0.0,
            match_source: None,
            song_id: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched_db_title.is_some()
    }
}

/// Round to three decimals for the report artifact.
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence * 1000.0).round() / 1000.0
}

fn serialize_confidence<S: Serializer>(confidence: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_confidence(*confidence))
}

/// Catalog ids are opaque strings, but older reports store SQLite rowids
/// as JSON numbers.
fn deserialize_song_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    }))
}

/// `match_source` is an empty string when nothing matched.
mod match_source_field {
    use super::MatchSource;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        source: &Option<MatchSource>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(source.map_or("", MatchSource::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<MatchSource>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "" => Ok(None),
            "main" => Ok(Some(MatchSource::Main)),
            "subtitle" => Ok(Some(MatchSource::Subtitle)),
            "slug" => Ok(Some(MatchSource::Slug)),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["", "main", "subtitle", "slug"],
            )),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Summary counts written at the top of the report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub total_lyrics: usize,
    pub certain: usize,
    pub uncertain: usize,
    pub likely_wrong: usize,
    #[serde(default)]
    pub duplicate_titles: usize,
}

/// Confidence-tiered match report. Produced once per run, consumed once by
/// the importer, never mutated in between.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub certain: Vec<MatchResult>,
    pub uncertain: Vec<MatchResult>,
    pub likely_wrong: Vec<MatchResult>,
    /// Corpus titles whose parentheses did not fit `main(subtitle)`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs_review: Vec<String>,
}

impl Report {
    /// Read a report written by `write_to_file`.
    pub fn read_from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the report as pretty-printed UTF-8 JSON.
    pub fn write_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Operator answer for an uncertain match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
    SkipRest,
}

impl Decision {
    /// Parse a `y` / `n` / `s` answer (case-insensitive, surrounding whitespace ignored).
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_lowercase().as_str() {
            "y" => Some(Decision::Accept),
            "n" => Some(Decision::Reject),
            "s" => Some(Decision::SkipRest),
            _ => None,
        }
    }
}

/// Running counters for one import pass. Not persisted.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationStats {
    pub imported: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub already_had: usize,
}

impl ReconciliationStats {
    pub fn total(&self) -> usize {
        self.imported + self.skipped + self.rejected + self.already_had
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            tracing::info!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
