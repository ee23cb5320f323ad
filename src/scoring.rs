//! Similarity scoring between a normalized candidate and a normalized
//! catalog title.
//!
//! Two stages, both required:
//! - Meaningful-overlap gate: stopword-filtered token sets must intersect
//!   (hard reject with 0.0 otherwise)
//! - Character similarity: matching-blocks ratio over the full strings
//!
//! Character ratios alone over-match on short titles that only share a
//! particle like "στο"; the gate removes those before they can score.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::MatchConfig;

// ============================================================================
// Overlap Gate
// ============================================================================

/// Whitespace tokens of `text` minus the stoplist.
fn content_tokens<'a>(text: &'a str, stopwords: &FxHashSet<String>) -> FxHashSet<&'a str> {
    text.split_whitespace()
        .filter(|t| !stopwords.contains(*t))
        .collect()
}

/// Check that two normalized titles share meaningful content, not just
/// function words. Short titles additionally need the shared tokens to
/// cover `min_short_overlap_chars` characters.
pub fn has_meaningful_overlap(a: &str, b: &str, config: &MatchConfig) -> bool {
    let tokens_a = content_tokens(a, &config.stopwords);
    let tokens_b = content_tokens(b, &config.stopwords);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return false;
    }

    let common: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    if common.is_empty() {
        return false;
    }

    let shorter = a.chars().count().min(b.chars().count());
    if shorter < config.short_title_chars {
        let common_chars: usize = common.iter().map(|w| w.chars().count()).sum();
        return common_chars >= config.min_short_overlap_chars;
    }

    true
}

// ============================================================================
// Matching-Blocks Ratio
// ============================================================================

/// Sequences at least this long get their popular elements ignored
/// when seeding matches.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Longest-common-block matcher over two character sequences
/// (Ratcliff/Obershelp "gestalt" matching).
struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each element of `b`, popular elements removed.
    b2j: FxHashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: FxHashMap<char, Vec<usize>> = FxHashMap::default();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, idxs| idxs.len() <= ntest);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` × `b[blo..bhi]`.
    /// Earliest in `a`, then earliest in `b`, among equally long blocks.
    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        let mut j2len: FxHashMap<usize, usize> = FxHashMap::default();
        for i in alo..ahi {
            let mut new_j2len: FxHashMap<usize, usize> = FxHashMap::default();
            if let Some(positions) = self.b2j.get(&a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Popular elements were left out of b2j; grow the block over them.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total length of all matching blocks.
    fn matched_chars(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }
}

/// Similarity ratio in [0, 1]: `2 * matched / (len(a) + len(b))`.
/// Two empty strings are identical (1.0).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = BlockMatcher::new(&a, &b).matched_chars();
    2.0 * matched as f64 / total as f64
}

// ============================================================================
// Combined Score
// ============================================================================

/// Score a normalized candidate against a normalized catalog title.
/// Returns exactly 0.0 when the overlap gate rejects the pair.
pub fn score(candidate_norm: &str, catalog_norm: &str, config: &MatchConfig) -> f64 {
    if !has_meaningful_overlap(candidate_norm, catalog_norm, config) {
        return 0.0;
    }
    sequence_ratio(candidate_norm, catalog_norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn cfg() -> MatchConfig {
        MatchConfig::default()
    }

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(sequence_ratio("καλογερος", "καλογερος"), 1.0);
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_ratio_known_values() {
        // 2 * 3 / 8
        assert!((sequence_ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
        // "ab" + "d" matched out of "abcd" / "abd": 2 * 3 / 7
        assert!((sequence_ratio("abcd", "abd") - 6.0 / 7.0).abs() < 1e-12);
        // Only "x" matches; the leftovers on either side differ
        assert!((sequence_ratio("axb", "bxa") - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_counts_characters_not_bytes() {
        // Greek letters are two bytes each in UTF-8.
        assert!((sequence_ratio("αβγδ", "βγδε") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_long_strings_with_popular_chars() {
        let a = "a".repeat(250);
        let b = "a".repeat(250);
        // Popular characters are skipped when seeding but blocks still extend over them.
        assert_eq!(sequence_ratio(&a, &b), 1.0);
    }

    #[test]
    fn test_stopword_only_overlap_rejected() {
        let config = cfg();
        assert_eq!(score("στο", "στο", &config), 0.0);
        assert_eq!(score("στο", "στο βαπορι", &config), 0.0);
        assert_eq!(score("η μαρικα στο", "η ελενη στο", &config), 0.0);
    }

    #[test]
    fn test_short_titles_need_three_shared_chars() {
        let config = cfg();
        // "ας" shared by both but only two characters long
        assert!(!has_meaningful_overlap("ας πα", "ας μη", &config));
        assert!(has_meaningful_overlap("φως μου", "φως", &config));
    }

    #[test]
    fn test_short_title_cutoff_is_fifteen_chars() {
        let config = cfg();
        // Shared token "αβ" covers only two characters.
        let a14 = format!("αβ {}", "γ".repeat(11));
        let b14 = format!("αβ {}", "δ".repeat(11));
        assert_eq!(a14.chars().count(), 14);
        assert!(!has_meaningful_overlap(&a14, &b14, &config));
        assert_eq!(score(&a14, &b14, &config), 0.0);

        let a15 = format!("αβ {}", "γ".repeat(12));
        let b15 = format!("αβ {}", "δ".repeat(12));
        assert_eq!(a15.chars().count(), 15);
        assert!(has_meaningful_overlap(&a15, &b15, &config));
        assert!(score(&a15, &b15, &config) > 0.0);

        // One side at 14 keeps the short rule even when the other is longer.
        assert!(!has_meaningful_overlap(&a14, &b15, &config));
    }

    #[test]
    fn test_long_titles_pass_on_any_shared_token() {
        let config = cfg();
        let a = "το βαπορι απ την περσια";
        let b = "ας ερθει το βαπορι";
        assert!(a.chars().count() >= 15 && b.chars().count() >= 15);
        assert!(has_meaningful_overlap(a, b, &config));
        let long_a = "μια νυχτα μ εβαλαν φυλακη";
        let long_b = "ω μια νυχτα σκοτεινη πολυ";
        assert!(has_meaningful_overlap(long_a, long_b, &config));
    }

    #[test]
    fn test_score_identical_non_stopword() {
        let config = cfg();
        let x = normalize("Καλόγερος");
        assert_eq!(score(&x, &x, &config), 1.0);
        let y = normalize("Μινόρε της αυγής");
        assert_eq!(score(&y, &y, &config), 1.0);
    }

    #[test]
    fn test_score_bounded() {
        let config = cfg();
        let s = score("καλογερος μου", "ο καλογερος", &config);
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn test_score_empty_inputs() {
        let config = cfg();
        assert_eq!(score("", "καλογερος", &config), 0.0);
        assert_eq!(score("", "", &config), 0.0);
    }

    #[test]
    fn test_custom_stoplist() {
        let config = MatchConfig::default().with_stopwords("the, of");
        assert_eq!(score("the end", "the start", &config), 0.0);
        // Default Greek particles are no longer filtered.
        assert!(score("στο", "στο", &config) > 0.0);
    }
}
