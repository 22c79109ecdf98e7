//! Batch accumulator bounding one output artifact
//!
//! Rows for a window (acquisition) or an input artifact (annotation) are
//! buffered here and handed out in one piece at the batch boundary. Taking the
//! batch always leaves the accumulator empty, so whatever happened inside one
//! batch can never leak rows into the next.

/// Scoped row buffer that is flushed and reset at every batch boundary
#[derive(Debug)]
pub struct BatchAccumulator<R> {
    label: String,
    rows: Vec<R>,
}

impl<R> BatchAccumulator<R> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rows: Vec::new(),
        }
    }

    /// Label of the batch currently being filled (used in log lines)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Push a row into the current batch
    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    /// Push every row from an iterator into the current batch
    pub fn extend(&mut self, rows: impl IntoIterator<Item = R>) {
        self.rows.extend(rows);
    }

    /// Number of rows currently buffered
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Close the current batch.
    ///
    /// Returns the buffered rows, or `None` when the batch is empty. Either way
    /// the accumulator is reset and relabelled for the next batch.
    pub fn take_batch(&mut self, next_label: impl Into<String>) -> Option<Vec<R>> {
        self.label = next_label.into();
        let rows = std::mem::take(&mut self.rows);
        if rows.is_empty() {
            None
        } else {
            Some(rows)
        }
    }
}
