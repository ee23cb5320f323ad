//! Import step: write matched lyrics into the catalog exactly once per entity.
//!
//! Certain matches are written directly, uncertain ones only after the
//! operator accepts them, likely-wrong ones never. An entity whose field is
//! already populated is left alone, so reruns never clobber curated data.
//!
//! Precondition: the caller has backed up the catalog. Writes made before a
//! store failure are not rolled back.

use tracing::{debug, info, warn};

use crate::catalog::CatalogStore;
use crate::confirm::Confirm;
use crate::corpus::clean_lyrics;
use crate::error::{ApplyError, ReconcileError};
use crate::models::{Decision, MatchResult, PayloadIndex, ReconciliationStats, Report};

/// What happened to one report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Imported,
    AlreadyHad,
    Skipped,
    Rejected,
    StopUncertain,
}

/// Entity id and payload for an entry, or None if the entry cannot be written.
fn writable<'a>(result: &'a MatchResult, payloads: &'a PayloadIndex) -> Option<(&'a str, &'a str)> {
    let Some(id) = result.song_id.as_deref() else {
        warn!("No catalog id for '{}', skipping", result.lyric_title);
        return None;
    };
    let Some(payload) = payloads.get(&result.lyric_title) else {
        warn!("No corpus payload for '{}', skipping", result.lyric_title);
        return None;
    };
    Some((id, payload.lyrics.as_str()))
}

fn has_value<S: CatalogStore>(store: &S, id: &str) -> Result<bool, ReconcileError> {
    Ok(store.existing_value(id)?.is_some_and(|v| !v.is_empty()))
}

fn write<S: CatalogStore>(
    store: &mut S,
    id: &str,
    lyrics: &str,
    title: &str,
) -> Result<(), ReconcileError> {
    store.update_field(id, &clean_lyrics(lyrics))?;
    debug!("Imported lyrics for '{}' into {}", title, id);
    Ok(())
}

fn apply_certain<S: CatalogStore>(
    result: &MatchResult,
    payloads: &PayloadIndex,
    store: &mut S,
) -> Result<Outcome, ReconcileError> {
    let Some((id, lyrics)) = writable(result, payloads) else {
        return Ok(Outcome::Skipped);
    };
    if has_value(store, id)? {
        return Ok(Outcome::AlreadyHad);
    }
    write(store, id, lyrics, &result.lyric_title)?;
    Ok(Outcome::Imported)
}

fn apply_uncertain<S: CatalogStore, C: Confirm>(
    result: &MatchResult,
    payloads: &PayloadIndex,
    store: &mut S,
    confirm: &mut C,
) -> Result<Outcome, ReconcileError> {
    let Some((id, lyrics)) = writable(result, payloads) else {
        return Ok(Outcome::Skipped);
    };
    if has_value(store, id)? {
        return Ok(Outcome::AlreadyHad);
    }

    let catalog_title = result.matched_db_title.as_deref().unwrap_or_default();
    match confirm.confirm(&result.lyric_title, catalog_title) {
        Decision::Accept => {
            write(store, id, lyrics, &result.lyric_title)?;
            Ok(Outcome::Imported)
        }
        Decision::Reject => Ok(Outcome::Rejected),
        Decision::SkipRest => Ok(Outcome::StopUncertain),
    }
}

fn record(stats: &mut ReconciliationStats, outcome: Outcome) {
    match outcome {
        Outcome::Imported => stats.imported += 1,
        Outcome::AlreadyHad => stats.already_had += 1,
        Outcome::Skipped | Outcome::StopUncertain => stats.skipped += 1,
        Outcome::Rejected => stats.rejected += 1,
    }
}

/// Run one import pass over `report`.
///
/// Processes every certain entry in report order, then the uncertain ones
/// until the operator answers "skip rest"; that entry and all remaining
/// uncertain entries count as skipped without being looked at.
/// Likely-wrong entries are never touched.
///
/// A store failure ends the pass; the error carries the stats so far.
pub fn apply<S: CatalogStore, C: Confirm>(
    report: &Report,
    payloads: &PayloadIndex,
    store: &mut S,
    confirm: &mut C,
) -> Result<ReconciliationStats, ApplyError> {
    let mut stats = ReconciliationStats::default();

    info!("Processing {} certain matches", report.certain.len());
    for result in &report.certain {
        match apply_certain(result, payloads, store) {
            Ok(outcome) => record(&mut stats, outcome),
            Err(source) => return Err(ApplyError { stats, source }),
        }
    }
    info!("Imported {} certain matches", stats.imported);

    info!("Processing {} uncertain matches", report.uncertain.len());
    for (idx, result) in report.uncertain.iter().enumerate() {
        let outcome = match apply_uncertain(result, payloads, store, confirm) {
            Ok(outcome) => outcome,
            Err(source) => return Err(ApplyError { stats, source }),
        };
        record(&mut stats, outcome);

        if outcome == Outcome::StopUncertain {
            let remaining = report.uncertain.len() - idx - 1;
            stats.skipped += remaining;
            info!("Skipping the remaining {} uncertain matches", remaining);
            break;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoAccept;
    use crate::error::Result;
    use crate::models::{CatalogEntity, LyricsPayload, MatchSource};
    use rustc_hash::FxHashMap;

    /// In-memory store that records every write.
    #[derive(Default)]
    struct MemoryStore {
        values: FxHashMap<String, String>,
        writes: Vec<(String, String)>,
        fail_writes_after: Option<usize>,
    }

    impl CatalogStore for MemoryStore {
        fn list_entities(&self) -> Result<Vec<CatalogEntity>> {
            Ok(Vec::new())
        }

        fn existing_value(&self, id: &str) -> Result<Option<String>> {
            Ok(self.values.get(id).cloned())
        }

        fn update_field(&mut self, id: &str, value: &str) -> Result<()> {
            if self.fail_writes_after.is_some_and(|n| self.writes.len() >= n) {
                return Err(ReconcileError::StoreUnavailable(rusqlite::Error::InvalidQuery));
            }
            self.values.insert(id.to_string(), value.to_string());
            self.writes.push((id.to_string(), value.to_string()));
            Ok(())
        }
    }

    /// Replays scripted answers and records what was asked.
    struct Scripted {
        answers: Vec<Decision>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn new(answers: Vec<Decision>) -> Self {
            Self {
                answers,
                asked: Vec::new(),
            }
        }
    }

    impl Confirm for Scripted {
        fn confirm(&mut self, corpus_title: &str, _catalog_title: &str) -> Decision {
            self.asked.push(corpus_title.to_string());
            if self.answers.is_empty() {
                Decision::Reject
            } else {
                self.answers.remove(0)
            }
        }
    }

    fn matched(title: &str, id: &str, confidence: f64) -> MatchResult {
        MatchResult {
            lyric_title: title.to_string(),
            url_slug: title.to_lowercase(),
            matched_db_title: Some(title.to_string()),
            confidence,
            match_source: Some(MatchSource::Main),
            song_id: Some(id.to_string()),
        }
    }

    fn payloads(titles: &[&str]) -> PayloadIndex {
        titles
            .iter()
            .map(|t| {
                (
                    t.to_string(),
                    LyricsPayload {
                        lyrics: format!("στίχοι {t}]]"),
                        ..LyricsPayload::default()
                    },
                )
            })
            .collect()
    }

    fn report(
        certain: Vec<MatchResult>,
        uncertain: Vec<MatchResult>,
        wrong: Vec<MatchResult>,
    ) -> Report {
        Report {
            certain,
            uncertain,
            likely_wrong: wrong,
            ..Report::default()
        }
    }

    #[test]
    fn test_certain_already_had_is_not_written() {
        let mut store = MemoryStore::default();
        store.values.insert("s1".into(), "curated".into());
        let report = report(vec![matched("Καλόγερος", "s1", 1.0)], vec![], vec![]);

        let stats = apply(&report, &payloads(&["Καλόγερος"]), &mut store, &mut AutoAccept).unwrap();

        assert_eq!(stats.imported, 0);
        assert_eq!(stats.already_had, 1);
        assert!(store.writes.is_empty());
        assert_eq!(store.values["s1"], "curated");
    }

    #[test]
    fn test_certain_written_cleaned() {
        let mut store = MemoryStore::default();
        store.values.insert("s1".into(), String::new());
        let report = report(vec![matched("Καλόγερος", "s1", 0.9)], vec![], vec![]);

        let stats = apply(&report, &payloads(&["Καλόγερος"]), &mut store, &mut AutoAccept).unwrap();

        assert_eq!(stats.imported, 1);
        assert_eq!(store.writes, vec![("s1".to_string(), "στίχοι Καλόγερος".to_string())]);
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let mut store = MemoryStore::default();
        let report = report(
            vec![matched("Α", "1", 1.0), matched("Β", "2", 0.9)],
            vec![matched("Γ", "3", 0.75)],
            vec![],
        );
        let payloads = payloads(&["Α", "Β", "Γ"]);

        let first = apply(&report, &payloads, &mut store, &mut AutoAccept).unwrap();
        assert_eq!(first.imported, 3);
        let writes_after_first = store.writes.len();

        let second = apply(&report, &payloads, &mut store, &mut AutoAccept).unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.already_had, 3);
        assert_eq!(store.writes.len(), writes_after_first);
    }

    #[test]
    fn test_wrong_tier_never_written() {
        let mut store = MemoryStore::default();
        let unmatched = MatchResult::unmatched("Στο", "sto");
        let report = report(vec![], vec![], vec![matched("Λάθος", "9", 0.5), unmatched]);

        let payloads = payloads(&["Λάθος", "Στο"]);
        let stats = apply(&report, &payloads, &mut store, &mut AutoAccept).unwrap();

        assert_eq!(stats, ReconciliationStats::default());
        assert!(store.writes.is_empty());
    }

    #[test]
    fn test_uncertain_accept_reject() {
        let mut store = MemoryStore::default();
        let report = report(vec![], vec![matched("Α", "1", 0.8), matched("Β", "2", 0.75)], vec![]);
        let mut confirm = Scripted::new(vec![Decision::Reject, Decision::Accept]);

        let stats = apply(&report, &payloads(&["Α", "Β"]), &mut store, &mut confirm).unwrap();

        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.imported, 1);
        assert_eq!(store.writes.len(), 1);
        assert_eq!(store.writes[0].0, "2");
    }

    #[test]
    fn test_skip_rest_counts_remaining_without_evaluating() {
        let mut store = MemoryStore::default();
        // "Γ" already has lyrics but is after the skip: counted skipped, not already_had.
        store.values.insert("3".into(), "existing".into());
        let report = report(
            vec![matched("Ω", "0", 0.95)],
            vec![matched("Α", "1", 0.8), matched("Β", "2", 0.78), matched("Γ", "3", 0.72)],
            vec![],
        );
        let mut confirm = Scripted::new(vec![Decision::Accept, Decision::SkipRest]);

        let payloads = payloads(&["Ω", "Α", "Β", "Γ"]);
        let stats = apply(&report, &payloads, &mut store, &mut confirm).unwrap();

        assert_eq!(
            stats,
            ReconciliationStats {
                imported: 2,
                skipped: 2,
                rejected: 0,
                already_had: 0,
            }
        );
        assert_eq!(confirm.asked, vec!["Α".to_string(), "Β".to_string()]);
    }

    #[test]
    fn test_uncertain_already_had_does_not_prompt() {
        let mut store = MemoryStore::default();
        store.values.insert("1".into(), "existing".into());
        let report = report(vec![], vec![matched("Α", "1", 0.8)], vec![]);
        let mut confirm = Scripted::new(vec![Decision::Accept]);

        let stats = apply(&report, &payloads(&["Α"]), &mut store, &mut confirm).unwrap();

        assert_eq!(stats.already_had, 1);
        assert!(confirm.asked.is_empty());
    }

    #[test]
    fn test_missing_payload_skipped() {
        let mut store = MemoryStore::default();
        let report = report(vec![matched("Α", "1", 0.9)], vec![matched("Β", "2", 0.8)], vec![]);
        let mut confirm = Scripted::new(vec![Decision::Accept]);

        let stats = apply(&report, &payloads(&[]), &mut store, &mut confirm).unwrap();

        assert_eq!(stats.skipped, 2);
        assert!(store.writes.is_empty());
        assert!(confirm.asked.is_empty());
    }

    #[test]
    fn test_store_failure_returns_partial_stats() {
        let mut store = MemoryStore {
            fail_writes_after: Some(1),
            ..MemoryStore::default()
        };
        let report = report(vec![matched("Α", "1", 1.0), matched("Β", "2", 0.9)], vec![], vec![]);

        let err = apply(&report, &payloads(&["Α", "Β"]), &mut store, &mut AutoAccept).unwrap_err();

        assert_eq!(err.stats.imported, 1);
        assert!(matches!(err.source, ReconcileError::StoreUnavailable(_)));
        assert_eq!(store.writes.len(), 1);
    }
}
