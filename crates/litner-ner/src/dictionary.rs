//! Gazetteer annotator backed by an Aho-Corasick automaton
//!
//! Lexicon format, one entry per line:
//!
//! ```text
//! # comment
//! chlorophyll a<TAB>CHEMICAL
//! rbcL<TAB>GENE
//! ```
//!
//! Matching is ASCII case-insensitive. Only matches that start and end on
//! word boundaries count; among those, the longest one at each position wins
//! and overlapping matches are dropped left to right.

use std::path::Path;

use aho_corasick::AhoCorasick;
use anyhow::{Context, Result, bail, ensure};
use rustc_hash::FxHashSet;

use crate::annotator::{Annotator, Mention};

/// One lexicon line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    pub term: String,
    pub label: String,
}

/// Read a tab-separated `term<TAB>label` lexicon.
pub fn load_lexicon(path: &Path) -> Result<Vec<LexiconEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open lexicon {}", path.display()))?;

    let mut entries = Vec::new();
    for result in reader.records() {
        let record =
            result.with_context(|| format!("Failed to read lexicon {}", path.display()))?;
        let line = record.position().map_or(0, |p| p.line());
        match (record.get(0), record.get(1)) {
            (Some(term), Some(label)) if !term.is_empty() && !label.is_empty() => {
                entries.push(LexiconEntry {
                    term: term.to_string(),
                    label: label.to_string(),
                });
            }
            // blank line
            (Some(""), None) => {}
            _ => bail!(
                "{}:{line}: expected `term<TAB>label`",
                path.display()
            ),
        }
    }
    Ok(entries)
}

/// Dictionary-matching [`Annotator`]
pub struct DictionaryAnnotator {
    automaton: AhoCorasick,
    /// Label per pattern index
    labels: Vec<String>,
    /// Match spans reused across calls: (start, end, pattern)
    spans: Vec<(usize, usize, usize)>,
}

impl std::fmt::Debug for DictionaryAnnotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryAnnotator")
            .field("patterns", &self.labels.len())
            .finish_non_exhaustive()
    }
}

impl DictionaryAnnotator {
    /// Build from lexicon entries. Terms repeated case-insensitively keep
    /// their first label.
    pub fn new(entries: impl IntoIterator<Item = LexiconEntry>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        let mut patterns = Vec::new();
        let mut labels = Vec::new();
        for entry in entries {
            if seen.insert(entry.term.to_lowercase()) {
                patterns.push(entry.term);
                labels.push(entry.label);
            }
        }
        ensure!(!patterns.is_empty(), "lexicon has no entries");

        // Standard semantics: overlapping search needs every candidate, so a
        // shorter term survives when the longest one is glued to a word.
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&patterns)
            .context("Failed to build lexicon automaton")?;

        Ok(Self {
            automaton,
            labels,
            spans: Vec::new(),
        })
    }

    /// Load a lexicon file and build the annotator.
    pub fn from_lexicon(path: &Path) -> Result<Self> {
        Self::new(load_lexicon(path)?)
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.labels.len()
    }
}

impl Annotator for DictionaryAnnotator {
    fn annotate(&mut self, text: &str) -> Result<Vec<Mention>> {
        self.spans.clear();
        for m in self.automaton.find_overlapping_iter(text) {
            if on_word_boundary(text, m.start(), m.end()) {
                self.spans.push((m.start(), m.end(), m.pattern().as_usize()));
            }
        }
        // leftmost first, then longest
        self.spans
            .sort_unstable_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));

        let mut mentions = Vec::new();
        let mut covered = 0;
        for &(start, end, pattern) in &self.spans {
            if start < covered {
                continue;
            }
            mentions.push(Mention::new(&text[start..end], &self.labels[pattern]));
            covered = end;
        }
        Ok(mentions)
    }

    fn reclaim(&mut self) {
        self.spans = Vec::new();
    }
}

/// Whether `text[start..end]` is not glued to a neighbouring word character
fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}
