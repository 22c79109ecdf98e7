//! litner NER - entity annotation over acquisition artifacts
//!
//! Reads the CSV artifacts written by `litner-pubmed`, runs an [`Annotator`]
//! over each record's title and abstract, and writes one deduplicated entity
//! artifact per input artifact.
//!
//! # Example
//!
//! ```ignore
//! use litner_core::ProgressContext;
//! use litner_ner::{Config, DictionaryAnnotator, run};
//!
//! let mut annotator = DictionaryAnnotator::from_lexicon("lexicon.tsv".as_ref())?;
//! let config = Config {
//!     output_dir: "entities".into(),
//!     chunk_size: Some(500),
//! };
//!
//! let summary = run(&["output".into()], &mut annotator, &config, &ProgressContext::new())?;
//! println!("Wrote {} entities", summary.mentions_written);
//! ```

pub mod annotator;
pub mod config;
pub mod dictionary;
pub mod extract;
pub mod input;
pub mod runner;

// Re-exports
pub use annotator::{Annotator, Mention};
pub use config::Config;
pub use dictionary::{DictionaryAnnotator, LexiconEntry, load_lexicon};
pub use runner::{ArtifactOutcome, SkipReason, Summary, annotate_artifact, run};
