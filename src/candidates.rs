//! Candidate extraction: the comparison strings derived from one corpus title.
//!
//! A raw title yields, in this order:
//! 1. the main text (or the whole title when it does not fit `main(subtitle)`)
//! 2. the parenthetical subtitle, when present
//! 3. a title rebuilt from the URL slug
//!
//! Emission order matters: the matcher keeps the first of equally scored pairs.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Candidate, MatchSource};
use crate::normalize::title_case;

/// `Main(Subtitle)`: a single, non-nested parenthetical closing the title.
pub static MAIN_SUBTITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^()]+)\(([^()]+)\)$").unwrap());

/// Separator between the title part of a slug and the rest (artist etc.).
pub const SLUG_SECTION_SEPARATOR: &str = "--";

/// Default path segment that precedes the slug in corpus URLs.
pub const DEFAULT_SLUG_MARKER: &str = "/songs/";

/// Split `Main(Subtitle)` into its two parts.
/// Returns None for titles without parentheses or that do not fit the pattern.
pub fn split_subtitle(title: &str) -> Option<(&str, &str)> {
    if !title.contains('(') {
        return None;
    }
    let caps = MAIN_SUBTITLE.captures(title)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// True for titles that carry parentheses but do not fit `Main(Subtitle)`,
/// e.g. nested groups or text after the closing parenthesis.
/// These are matched on the whole string and flagged for manual review.
pub fn is_irregular_title(title: &str) -> bool {
    (title.contains('(') || title.contains(')')) && split_subtitle(title).is_none()
}

/// Extract the slug from a corpus URL: everything after the last `marker`.
/// A URL without the marker is returned whole.
/// e.g., "https://rebet.gr/songs/kalogeros--markos" → "kalogeros--markos"
pub fn url_slug<'a>(url: &'a str, marker: &str) -> &'a str {
    match url.rfind(marker) {
        Some(pos) => &url[pos + marker.len()..],
        None => url,
    }
}

/// Rebuild a readable title from a slug.
/// e.g., "kalogeros--varethika-tis-gkomenes" → "Kalogeros"
pub fn title_from_slug(slug: &str) -> String {
    let head = slug.split(SLUG_SECTION_SEPARATOR).next().unwrap_or("");
    title_case(&head.replace('-', " "))
}

/// Derive the ordered candidates for one corpus title.
pub fn extract_candidates(raw_title: &str, url_slug: &str) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(3);

    match split_subtitle(raw_title) {
        Some((main, subtitle)) => {
            candidates.push(Candidate::new(main, MatchSource::Main));
            candidates.push(Candidate::new(subtitle, MatchSource::Subtitle));
        }
        None => candidates.push(Candidate::new(raw_title, MatchSource::Main)),
    }

    candidates.push(Candidate::new(title_from_slug(url_slug), MatchSource::Slug));
    candidates
}
