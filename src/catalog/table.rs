//! CSV tables: per-source listing tables in, merged catalog out.
//!
//! Source tables have exactly three columns read by position,
//! `name, price|score, url`; header names are ignored. Absent values in the
//! merged table are written as an explicit `null` marker.

use crate::catalog::merge::OFFER_SOURCES;
use crate::catalog::models::{CatalogEntry, ListingRecord, Source};
use crate::error::TableError;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Marker written for absent values.
pub const NULL_MARKER: &str = "null";

/// Header row for a source table.
pub fn source_header(source: Source) -> [&'static str; 3] {
    ["name", source.value_column(), "url"]
}

/// Header row for the merged catalog.
pub fn catalog_header() -> Vec<String> {
    let mut header = vec!["name".to_string()];
    header.extend(OFFER_SOURCES.iter().map(|s| format!("{}_price", s)));
    header.push("metascore".to_string());
    header.extend(OFFER_SOURCES.iter().map(|s| format!("{}_url", s)));
    header
}

/// Reads a source table from disk.
pub fn read_source_table(path: &Path, source: Source) -> Result<Vec<ListingRecord>, TableError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| TableError::Read { path: path.to_path_buf(), source: e })?;
    let records = read_records(reader, path, source)?;
    debug!("Read {} {} rows from {}", records.len(), source, path.display());
    Ok(records)
}

/// Reads a source table from any reader (header row expected).
pub fn read_source_rows<R: io::Read>(
    rdr: R,
    label: &Path,
    source: Source,
) -> Result<Vec<ListingRecord>, TableError> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    read_records(reader, label, source)
}

fn read_records<R: io::Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
    source: Source,
) -> Result<Vec<ListingRecord>, TableError> {
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| TableError::Read { path: path.to_path_buf(), source: e })?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.len() != 3 {
            return Err(TableError::ColumnCount {
                path: path.to_path_buf(),
                line,
                found: row.len(),
            });
        }

        // Kept verbatim; the merged catalog reuses the primary display name.
        let name = &row[0];
        if name.trim().is_empty() {
            warn!("{} line {}: empty name, skipping row", path.display(), line);
            continue;
        }

        let value = cell(&row[1]);
        let url = cell(&row[2]);

        let record = if source.is_storefront() {
            ListingRecord::storefront(source, name, value, url)
        } else {
            ListingRecord::critic(name, value.and_then(parse_score), url)
        };
        records.push(record);
    }

    Ok(records)
}

fn cell(raw: &str) -> Option<&str> {
    let value = raw.trim();
    if value.is_empty() || value == NULL_MARKER {
        None
    } else {
        Some(value)
    }
}

/// Parses a critic score; non-numeric text such as "tbd" yields None.
pub fn parse_score(text: &str) -> Option<u32> {
    let text = text.trim();
    text.parse::<u32>().ok().or_else(|| {
        text.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.round() as u32)
    })
}

/// Writes the merged catalog to a CSV file.
pub fn write_catalog(path: &Path, entries: &[CatalogEntry]) -> Result<(), TableError> {
    let writer = csv::Writer::from_path(path)
        .map_err(|source| TableError::Write { path: path.to_path_buf(), source })?;
    write_entries(writer, entries)
        .map_err(|source| TableError::Write { path: path.to_path_buf(), source })
}

/// Renders the merged catalog as CSV text.
pub fn catalog_to_csv(entries: &[CatalogEntry]) -> String {
    let mut buf = Vec::new();
    if let Err(e) = write_entries(csv::Writer::from_writer(&mut buf), entries) {
        warn!("Failed to render catalog as CSV: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_entries<W: io::Write>(
    mut writer: csv::Writer<W>,
    entries: &[CatalogEntry],
) -> Result<(), csv::Error> {
    writer.write_record(catalog_header())?;
    for entry in entries {
        writer.write_record(catalog_row(entry))?;
    }
    writer.flush()?;
    Ok(())
}

/// One merged row in header order.
pub fn catalog_row(entry: &CatalogEntry) -> Vec<String> {
    let or_null = |v: Option<&str>| v.unwrap_or(NULL_MARKER).to_string();

    let mut row = vec![entry.name.clone()];
    row.extend(OFFER_SOURCES.iter().map(|s| or_null(entry.price(*s))));
    row.push(entry.score.map(|s| s.to_string()).unwrap_or_else(|| NULL_MARKER.to_string()));
    row.extend(OFFER_SOURCES.iter().map(|s| or_null(entry.url(*s))));
    row
}
