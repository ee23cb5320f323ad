//! Title normalization for corpus ↔ catalog matching.
//!
//! Folds case and strips accents so that "Μίνορε" and "μινορε" compare equal.
//! Scripts are preserved: Greek stays Greek, there is no transliteration.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Remove nonspacing marks (category Mn) after canonical decomposition.
/// Spacing marks such as Devanagari vowel signs are kept.
/// e.g., "Καλόγερος" → "Καλογερος", "Beyoncé" → "Beyonce"
pub fn strip_diacritics(s: &str) -> String {
    s.nfd()
        .filter(|c| c.general_category() != GeneralCategory::NonspacingMark)
        .collect()
}

/// Canonicalize a title for comparison.
///
/// Lower-cases, decomposes to NFD, drops combining marks and trims.
/// Lower-casing runs first so that characters whose lowercase form carries
/// a combining mark (e.g. "İ") still fold in a single pass, which keeps the
/// function idempotent. Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    strip_diacritics(&text.to_lowercase()).trim().to_string()
}

/// Title-case a string: the first letter of every alphabetic run upper-cased,
/// the remaining letters of the run lower-cased.
/// e.g., "kalogeros" → "Kalogeros", "o mpampis" → "O Mpampis"
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Collapse internal whitespace runs. Used only for display of titles in
/// logs and prompts; matching works on `normalize` output directly.
pub fn collapse_whitespace(s: &str) -> String {
    MULTI_SPACE.replace_all(s.trim(), " ").to_string()
}
