//! Annotation configuration

use std::path::PathBuf;

/// Runtime configuration for annotating artifacts
#[derive(Debug, Clone)]
pub struct Config {
    /// Output directory for entity artifacts
    pub output_dir: PathBuf,
    /// Rows per chunk; `None` or `Some(0)` processes each artifact in one pass
    pub chunk_size: Option<usize>,
}

impl Config {
    /// Chunk length for an artifact of `rows` rows (never zero)
    pub fn chunk_len(&self, rows: usize) -> usize {
        match self.chunk_size {
            Some(n) if n > 0 => n,
            _ => rows.max(1),
        }
    }

    pub fn is_chunked(&self) -> bool {
        self.chunk_size.is_some_and(|n| n > 0)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            chunk_size: None,
        }
    }
}
