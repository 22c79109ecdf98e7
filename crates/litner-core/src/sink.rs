//! CSV artifact writer with atomic tmp→rename

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Buffered CSV writer that only exposes the final file once complete.
///
/// The header row is derived from the serde field names of the first row.
pub struct CsvSink {
    writer: csv::Writer<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl CsvSink {
    /// Create a new sink writing to `<output_dir>/<filename>.tmp`
    pub fn create(output_dir: &Path, filename: &str) -> io::Result<Self> {
        let final_path = output_dir.join(filename);
        let tmp_path = output_dir.join(format!("{filename}.tmp"));

        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    /// Write one row
    pub fn write_row<T: Serialize>(&mut self, row: &T) -> io::Result<()> {
        self.writer.serialize(row).map_err(io::Error::other)?;
        self.row_count += 1;
        Ok(())
    }

    /// Flush buffered rows and atomically rename tmp → final.
    ///
    /// Returns the final path and the number of rows written.
    pub fn finalize(self) -> io::Result<(PathBuf, usize)> {
        let Self {
            mut writer,
            tmp_path,
            final_path,
            row_count,
        } = self;
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp_path, &final_path)?;
        Ok((final_path, row_count))
    }
}

/// Write a complete artifact in one go, creating `output_dir` first.
pub fn write_artifact<T: Serialize>(
    output_dir: &Path,
    filename: &str,
    rows: &[T],
) -> io::Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let mut sink = CsvSink::create(output_dir, filename)?;
    for row in rows {
        sink.write_row(row)?;
    }
    let (path, _) = sink.finalize()?;
    Ok(path)
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
