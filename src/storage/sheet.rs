//! Single-sheet CSV file holding the accepted listings.

use crate::error::StoreError;
use crate::models::{Listing, ListingDate};
use std::path::Path;
use tracing::debug;

/// A named column with a display width hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub width: usize,
}

pub const COLUMNS: [Column; 3] = [
    Column { name: "Date", width: 25 },
    Column { name: "Location", width: 40 },
    Column { name: "URL", width: 75 },
];

/// Whole-file row storage.
pub trait TabularStore {
    /// A missing file reads as no rows.
    fn read_all_rows(&self, path: &Path) -> Result<Vec<Listing>, StoreError>;

    /// Replaces the file with a header row of `columns` followed by `rows`.
    /// Formats without layout metadata ignore the width hints.
    fn write_all_rows(&self, path: &Path, rows: &[Listing], columns: &[Column]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSheet;

impl TabularStore for CsvSheet {
    fn read_all_rows(&self, path: &Path) -> Result<Vec<Listing>, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let read_err = |reason: String| StoreError::Read {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| read_err(e.to_string()))?;

        let headers = reader.headers().map_err(|e| read_err(e.to_string()))?.clone();
        let position = |column: &Column| {
            headers
                .iter()
                .position(|h| h == column.name)
                .ok_or_else(|| read_err(format!("missing column {:?}", column.name)))
        };
        let [date_at, location_at, url_at] = [
            position(&COLUMNS[0])?,
            position(&COLUMNS[1])?,
            position(&COLUMNS[2])?,
        ];

        // Short or blank rows are kept as they are; the whole sheet is rewritten on save.
        let mut rows = Vec::new();
        for (i, record) in reader.byte_records().enumerate() {
            let record = record.map_err(|e| read_err(format!("row {}: {}", i + 1, e)))?;
            let cell = |at: usize| {
                record
                    .get(at)
                    .map(|c| String::from_utf8_lossy(c).into_owned())
                    .unwrap_or_default()
            };
            if cell(url_at).is_empty() {
                debug!("Row {} in {:?} has no URL", i + 1, path);
            }
            rows.push(Listing {
                date: ListingDate::from_cell(&cell(date_at)),
                location: cell(location_at),
                url: cell(url_at),
            });
        }
        Ok(rows)
    }

    fn write_all_rows(&self, path: &Path, rows: &[Listing], columns: &[Column]) -> Result<(), StoreError> {
        let write_err = |reason: String| StoreError::Write {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| write_err(e.to_string()))?;

        // CSV has no column widths; `show` applies them instead.
        writer
            .write_record(columns.iter().map(|c| c.name))
            .map_err(|e| write_err(e.to_string()))?;
        for row in rows {
            writer.serialize(row).map_err(|e| write_err(e.to_string()))?;
        }
        writer.flush().map_err(|e| write_err(e.to_string()))?;
        Ok(())
    }
}

/// Pad or cut `cell` to `width` characters for terminal display.
pub fn fit(cell: &str, width: usize) -> String {
    let count = cell.chars().count();
    if count <= width {
        format!("{cell}{}", " ".repeat(width - count))
    } else {
        let mut cut: String = cell.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
