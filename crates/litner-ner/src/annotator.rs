//! The text annotation capability

use anyhow::Result;

/// One recognized entity occurrence, as produced by an [`Annotator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// Surface text as it appears in the input
    pub text: String,
    pub label: String,
}

impl Mention {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Text-to-entities function used by the annotation engine.
///
/// Implementations may keep internal buffers between calls; the engine calls
/// [`reclaim`](Annotator::reclaim) after every chunk so they can be released.
pub trait Annotator {
    /// Mentions found in `text`, in order of appearance.
    fn annotate(&mut self, text: &str) -> Result<Vec<Mention>>;

    /// Release transient resources held between calls.
    fn reclaim(&mut self) {}
}
