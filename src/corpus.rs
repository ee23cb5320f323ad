//! Corpus source: the scraped title → {url, lyrics} JSON file.

use std::path::Path;

use tracing::warn;

use crate::error::{ReconcileError, Result};
use crate::models::{CorpusEntry, LyricsPayload, PayloadIndex};

/// Corpus entries in file order, plus the entries that had to be dropped.
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    pub entries: Vec<CorpusEntry>,
    pub malformed: Vec<ReconcileError>,
}

impl LoadedCorpus {
    /// Payloads keyed by corpus title, for the importer.
    pub fn payloads(&self) -> PayloadIndex {
        self.entries
            .iter()
            .map(|e| (e.title.clone(), e.payload.clone()))
            .collect()
    }
}

fn malformed(title: &str, reason: &str) -> ReconcileError {
    ReconcileError::MalformedInput {
        title: title.to_string(),
        reason: reason.to_string(),
    }
}

/// Turn one `title: {...}` item into an entry.
fn parse_entry(title: &str, value: serde_json::Value) -> Result<CorpusEntry> {
    let mut fields = match value {
        serde_json::Value::Object(map) => map,
        _ => return Err(malformed(title, "entry is not an object")),
    };

    let url = match fields.remove("url") {
        Some(serde_json::Value::String(url)) => url,
        Some(_) => return Err(malformed(title, "'url' is not a string")),
        None => return Err(malformed(title, "missing 'url'")),
    };

    match fields.get("lyrics") {
        Some(serde_json::Value::String(_)) => {}
        Some(_) => return Err(malformed(title, "'lyrics' is not a string")),
        None => return Err(malformed(title, "missing 'lyrics'")),
    }

    let payload: LyricsPayload = serde_json::from_value(serde_json::Value::Object(fields))?;
    Ok(CorpusEntry {
        title: title.to_string(),
        url,
        payload,
    })
}

/// Parse corpus JSON text. Malformed entries are dropped and reported,
/// never fatal; only a document that is not a JSON object fails.
pub fn parse_corpus(raw: &str) -> Result<LoadedCorpus> {
    let document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
    let mut loaded = LoadedCorpus::default();

    for (title, value) in document {
        match parse_entry(&title, value) {
            Ok(entry) => loaded.entries.push(entry),
            Err(e) => {
                warn!("Skipping corpus entry: {}", e);
                loaded.malformed.push(e);
            }
        }
    }

    Ok(loaded)
}

/// Load the corpus file.
pub fn load_corpus(path: &Path) -> Result<LoadedCorpus> {
    let raw = std::fs::read_to_string(path)?;
    parse_corpus(&raw)
}

/// Strip scraper artifacts from lyrics text: every "]]" and "[\n", then
/// surrounding whitespace.
pub fn clean_lyrics(lyrics: &str) -> String {
    lyrics.replace("]]", "").replace("[\n", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Καλόγερος(Βαρέθηκα τις γκόμενες)": {
            "url": "https://rebet.gr/songs/kalogeros--varethika-tis-gkomenes",
            "lyrics": "Βαρέθηκα τις γκόμενες]]\n",
            "composer": "Μάρκος"
        },
        "Χωρίς στίχους": {"url": "https://rebet.gr/songs/xoris"},
        "Στο": {"url": "https://rebet.gr/songs/sto", "lyrics": "..."},
        "Λάθος": "not an object",
        "Αριθμός": {"url": 5, "lyrics": "x"}
    }"#;

    #[test]
    fn test_parse_keeps_file_order_and_extra_fields() {
        let corpus = parse_corpus(SAMPLE).unwrap();
        let titles: Vec<&str> = corpus.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Καλόγερος(Βαρέθηκα τις γκόμενες)", "Στο"]);

        let first = &corpus.entries[0];
        assert_eq!(first.url, "https://rebet.gr/songs/kalogeros--varethika-tis-gkomenes");
        assert_eq!(first.payload.lyrics, "Βαρέθηκα τις γκόμενες]]\n");
        assert_eq!(first.payload.extra["composer"], "Μάρκος");
        assert!(!first.payload.extra.contains_key("url"));
    }

    #[test]
    fn test_malformed_entries_are_reported_not_fatal() {
        let corpus = parse_corpus(SAMPLE).unwrap();
        assert_eq!(corpus.malformed.len(), 3);
        assert!(corpus
            .malformed
            .iter()
            .all(|e| matches!(e, ReconcileError::MalformedInput { .. })));
        let messages: Vec<String> = corpus.malformed.iter().map(|e| e.to_string()).collect();
        assert!(messages.iter().any(|m| m.contains("missing 'lyrics'")));
    }

    #[test]
    fn test_non_object_document_fails() {
        assert!(parse_corpus("[1, 2]").is_err());
        assert!(parse_corpus("not json").is_err());
    }

    #[test]
    fn test_payload_index() {
        let corpus = parse_corpus(SAMPLE).unwrap();
        let payloads = corpus.payloads();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads["Στο"].lyrics, "...");
    }

    #[test]
    fn test_clean_lyrics() {
        assert_eq!(clean_lyrics("  στίχος]]\nδεύτερος[\nτρίτος  "), "στίχος\nδεύτεροςτρίτος");
        assert_eq!(clean_lyrics("]]"), "");
    }
}
