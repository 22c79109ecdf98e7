//! Reading and validating acquisition artifacts

use std::path::Path;

use anyhow::{Context, Result};
use litner_core::record::{REQUIRED_INPUT_COLUMNS, normalize_column};

/// The columns of one input row the annotation engine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub id: String,
    pub title: String,
    pub abstract_text: String,
    pub publication_date: String,
}

/// Result of reading one artifact
#[derive(Debug)]
pub enum InputArtifact {
    /// Rows with a title and an abstract, in file order
    Rows { rows: Vec<InputRow>, dropped: usize },
    /// Required columns absent from the header
    MissingColumns(Vec<&'static str>),
}

/// Read an artifact, checking the header before any row is parsed.
///
/// Header names are compared after trimming and upper-casing. Rows with an
/// empty `TITLE` or `ABSTRACT` cell are dropped and counted.
pub fn read_artifact(path: &Path) -> Result<InputArtifact> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(normalize_column)
        .collect();

    let mut indices = [0usize; REQUIRED_INPUT_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, column) in indices.iter_mut().zip(REQUIRED_INPUT_COLUMNS) {
        match headers.iter().position(|h| h == column) {
            Some(i) => *slot = i,
            None => missing.push(column),
        }
    }
    if !missing.is_empty() {
        return Ok(InputArtifact::MissingColumns(missing));
    }
    let [id, title, abstract_text, publication_date] = indices;

    let mut rows = Vec::new();
    let mut dropped = 0;
    for result in reader.records() {
        let record = result.with_context(|| format!("Failed to read {}", path.display()))?;
        let cell = |i: usize| record.get(i).unwrap_or_default().to_string();

        let row = InputRow {
            id: cell(id),
            title: cell(title),
            abstract_text: cell(abstract_text),
            publication_date: cell(publication_date),
        };
        if row.title.is_empty() || row.abstract_text.is_empty() {
            dropped += 1;
            continue;
        }
        rows.push(row);
    }

    Ok(InputArtifact::Rows { rows, dropped })
}
