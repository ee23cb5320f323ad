//! Operator confirmation for uncertain matches.
//!
//! Three ways to answer: an interactive terminal prompt, a pre-recorded
//! decisions file, or accept-everything (`--auto`).

use std::io::{BufRead, Write};
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Decision;
use crate::normalize::collapse_whitespace;

/// Answers "is this corpus title the same song as this catalog title?".
/// Blocking, no timeout.
pub trait Confirm {
    fn confirm(&mut self, corpus_title: &str, catalog_title: &str) -> Decision;
}

impl<C: Confirm + ?Sized> Confirm for Box<C> {
    fn confirm(&mut self, corpus_title: &str, catalog_title: &str) -> Decision {
        (**self).confirm(corpus_title, catalog_title)
    }
}

/// Accepts every match.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoAccept;

impl Confirm for AutoAccept {
    fn confirm(&mut self, corpus_title: &str, catalog_title: &str) -> Decision {
        debug!("[AUTO] accepting '{}' -> '{}'", corpus_title, catalog_title);
        Decision::Accept
    }
}

/// Interactive y/n/s prompt.
///
/// Re-asks until the answer is one of `y`, `n`, `s`. End of input (or a
/// read error) counts as `s`, so an interrupted session skips the rest.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalPrompt<R, W> {
    fn confirm(&mut self, corpus_title: &str, catalog_title: &str) -> Decision {
        let _ = writeln!(self.output, "\n  Lyrics file: '{}'", collapse_whitespace(corpus_title));
        let _ = writeln!(self.output, "  Database:    '{}'", collapse_whitespace(catalog_title));

        loop {
            let _ = write!(self.output, "  Confirm match? (y/n/s to skip rest): ");
            let _ = self.output.flush();

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => return Decision::SkipRest,
                Ok(_) => {
                    if let Some(decision) = Decision::parse(&line) {
                        return decision;
                    }
                }
                Err(e) => {
                    warn!("Failed to read answer, skipping the rest: {}", e);
                    return Decision::SkipRest;
                }
            }
        }
    }
}

/// Pre-recorded answers: a JSON object `{corpus_title: "y" | "n" | "s"}`.
/// Titles without an answer are rejected.
#[derive(Debug, Default, Clone)]
pub struct DecisionFile {
    decisions: FxHashMap<String, Decision>,
}

impl DecisionFile {
    pub fn parse(raw: &str) -> Result<Self> {
        let answers: FxHashMap<String, String> = serde_json::from_str(raw)?;
        let mut decisions = FxHashMap::default();
        for (title, answer) in answers {
            match Decision::parse(&answer) {
                Some(decision) => {
                    decisions.insert(title, decision);
                }
                None => warn!("Ignoring unrecognized decision '{}' for '{}'", answer, title),
            }
        }
        Ok(Self { decisions })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

impl Confirm for DecisionFile {
    fn confirm(&mut self, corpus_title: &str, catalog_title: &str) -> Decision {
        let decision = self
            .decisions
            .get(corpus_title)
            .copied()
            .unwrap_or(Decision::Reject);
        debug!("[DECISIONS] '{}' -> '{}': {:?}", corpus_title, catalog_title, decision);
        decision
    }
}
