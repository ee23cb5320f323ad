//! Confidence tiers and the match report.

use std::cmp::Ordering;

use crate::config::MatchConfig;
use crate::models::{MatchResult, Report, ReportMetadata};

/// Confidence tier of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Imported without asking
    Certain,
    /// Imported only after operator confirmation
    Uncertain,
    /// Never imported
    Wrong,
}

/// Tier for a confidence value. Lower bounds are inclusive.
pub fn tier_for(confidence: f64, config: &MatchConfig) -> Tier {
    if confidence >= config.certain_threshold {
        Tier::Certain
    } else if confidence >= config.uncertain_threshold {
        Tier::Uncertain
    } else {
        Tier::Wrong
    }
}

fn by_confidence_desc(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal)
}

/// Partition results into tiers, each sorted by descending confidence.
/// The sort is stable: equal confidences keep their input order.
pub fn classify(results: Vec<MatchResult>, config: &MatchConfig) -> Report {
    let total = results.len();
    let mut certain = Vec::new();
    let mut uncertain = Vec::new();
    let mut likely_wrong = Vec::new();

    for result in results {
        match tier_for(result.confidence, config) {
            Tier::Certain => certain.push(result),
            Tier::Uncertain => uncertain.push(result),
            Tier::Wrong => likely_wrong.push(result),
        }
    }

    certain.sort_by(by_confidence_desc);
    uncertain.sort_by(by_confidence_desc);
    likely_wrong.sort_by(by_confidence_desc);

    Report {
        metadata: ReportMetadata {
            total_lyrics: total,
            certain: certain.len(),
            uncertain: uncertain.len(),
            likely_wrong: likely_wrong.len(),
            duplicate_titles: 0,
        },
        certain,
        uncertain,
        likely_wrong,
        needs_review: Vec::new(),
    }
}
