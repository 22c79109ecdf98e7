//! Per-row annotation and mention deduplication

use litner_core::EntityMention;
use litner_core::record::combined_text;
use rustc_hash::FxHashSet;

use crate::annotator::{Annotator, Mention};
use crate::input::InputRow;

/// Normalize mentions and keep the first occurrence of each form.
///
/// Returns `(entity_text, label)` pairs in first-seen order. Entity text is
/// trimmed and lower-cased; mentions that normalize to nothing are dropped.
pub fn dedup_mentions(mentions: Vec<Mention>) -> Vec<(String, String)> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::with_capacity(mentions.len());
    for mention in mentions {
        let text = mention.text.trim().to_lowercase();
        if text.is_empty() || seen.contains(&text) {
            continue;
        }
        seen.insert(text.clone());
        out.push((text, mention.label));
    }
    out
}

/// Annotate one row and build its deduplicated entity rows.
///
/// A row whose title or abstract is blank is skipped without calling the
/// annotator. An annotator failure counts as zero mentions.
pub fn annotate_row<A: Annotator + ?Sized>(row: &InputRow, annotator: &mut A) -> Vec<EntityMention> {
    let title = row.title.trim();
    let abstract_text = row.abstract_text.trim();
    if title.is_empty() || abstract_text.is_empty() {
        log::warn!("{}: blank title or abstract, skipping", row.id);
        return Vec::new();
    }

    let mentions = match annotator.annotate(&combined_text(title, abstract_text)) {
        Ok(mentions) => mentions,
        Err(e) => {
            log::warn!("{}: annotation failed: {e:#}", row.id);
            return Vec::new();
        }
    };

    dedup_mentions(mentions)
        .into_iter()
        .map(|(entity_text, label)| EntityMention {
            id: row.id.clone(),
            title: row.title.clone(),
            abstract_text: row.abstract_text.clone(),
            publication_date: row.publication_date.clone(),
            entity_text,
            label,
        })
        .collect()
}
