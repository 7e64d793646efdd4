//! Persistent output for collected listings.

use crate::catalog::models::{ListingRecord, Source};
use crate::catalog::table::{source_header, NULL_MARKER};
use crate::error::PersistenceError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only destination for flushed page buffers.
pub trait ListingSink {
    fn append(&mut self, records: &[ListingRecord]) -> Result<(), PersistenceError>;
}

/// Writes a source table (`name, price|score, url`) to a CSV file.
///
/// The file is truncated and the header written on creation; every append is
/// flushed so that rows survive a later fatal error.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    source: Source,
    rows: usize,
}

impl CsvSink {
    pub fn create(path: impl AsRef<Path>, source: Source) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| PersistenceError::Io { path: path.clone(), source: e })?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(source_header(source))?;
        writer.flush().map_err(|e| PersistenceError::Io { path: path.clone(), source: e })?;

        debug!("Created {} table at {}", source, path.display());
        Ok(Self { writer, path, source, rows: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written so far, excluding the header.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl ListingSink for CsvSink {
    fn append(&mut self, records: &[ListingRecord]) -> Result<(), PersistenceError> {
        for record in records {
            let value = if self.source.is_storefront() {
                record.price().map(String::from)
            } else {
                record.score().map(|s| s.to_string())
            };
            self.writer.write_record([
                record.display_name(),
                value.as_deref().unwrap_or(NULL_MARKER),
                record.url().unwrap_or(NULL_MARKER),
            ])?;
        }
        self.writer
            .flush()
            .map_err(|e| PersistenceError::Io { path: self.path.clone(), source: e })?;
        self.rows += records.len();
        Ok(())
    }
}

/// Keeps flushed records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ListingRecord>,
    pub flushes: usize,
}

impl ListingSink for MemorySink {
    fn append(&mut self, records: &[ListingRecord]) -> Result<(), PersistenceError> {
        self.records.extend_from_slice(records);
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::table::read_source_table;
    use tempfile::TempDir;

    #[test]
    fn test_csv_sink_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("steam.csv");

        let mut sink = CsvSink::create(&path, Source::Steam).unwrap();
        sink.append(&[ListingRecord::storefront(
            Source::Steam,
            "Hades",
            Some("₺199,99"),
            Some("https://s/hades"),
        )])
        .unwrap();
        sink.append(&[ListingRecord::storefront(Source::Steam, "Celeste", Some("₺40"), None)])
            .unwrap();
        assert_eq!(sink.rows(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("name,price,url"));
        assert_eq!(lines.next(), Some("Hades,\"₺199,99\",https://s/hades"));
        assert_eq!(lines.next(), Some("Celeste,₺40,null"));
    }

    #[test]
    fn test_csv_sink_output_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metacritic.csv");

        let mut sink = CsvSink::create(&path, Source::Metacritic).unwrap();
        sink.append(&[ListingRecord::critic("Hades", Some(93), Some("https://mc/hades"))]).unwrap();

        let records = read_source_table(&path, Source::Metacritic).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score(), Some(93));
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn test_csv_sink_bad_path() {
        let result = CsvSink::create("/nonexistent/dir/out.csv", Source::Steam);
        assert!(matches!(result, Err(PersistenceError::Io { .. })));
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::default();
        sink.append(&[]).unwrap();
        sink.append(&[ListingRecord::storefront(Source::Epic, "A", Some("₺1"), None)]).unwrap();
        assert_eq!(sink.flushes, 2);
        assert_eq!(sink.records.len(), 1);
    }
}
