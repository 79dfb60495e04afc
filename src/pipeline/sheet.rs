//! Spreadsheet access: one reader behind both the range scan and the table read.
//!
//! [`SpreadsheetReader`] owns the first worksheet's cell range and answers
//! both the range question and the table question from it, so a file either
//! opens for range detection and rendering alike or fails the same way for
//! both.
//!
//! Two open strategies exist:
//!
//! * [`SpreadsheetReader::open`]: format chosen from the file extension.
//! * [`SpreadsheetReader::open_sniffed`]: format detected from the bytes.
//!   Catches uploads whose extension lies (an `.xls` that is really a zip
//!   container, for example).
//!
//! Both release the file handle before returning.

use crate::error::SheetError;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bounding extent of non-empty cells, 1-based. `(0, 0)` means an empty sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRange {
    pub last_row: usize,
    pub last_col: usize,
}

impl ContentRange {
    /// Estimate the range from a tabular read: header row plus data rows.
    pub fn from_table(table: &TabularData) -> Self {
        Self {
            last_row: table.row_count() + 1,
            last_col: table.column_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_row == 0 || self.last_col == 0
    }

    /// `A1:<col><row>` notation for logs, e.g. `A1:C12`.
    pub fn a1(&self) -> String {
        if self.is_empty() {
            return "A1:A1 (empty)".to_string();
        }
        format!("A1:{}{}", column_letter(self.last_col), self.last_row)
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.a1())
    }
}

/// Convert a 1-based column number to spreadsheet letters (1 → A, 27 → AA).
pub fn column_letter(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// First-sheet contents as text: a header row plus rectangular data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabularData {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularData {
    /// Build from raw rows; the first row becomes the header and every
    /// data row is padded or truncated to the header width.
    pub fn from_rows(mut all: Vec<Vec<String>>) -> Self {
        if all.is_empty() {
            return Self::default();
        }
        let header = all.remove(0);
        let width = header.len();
        let rows = all
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { header, rows }
    }

    /// Number of data rows (header excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

/// The first worksheet of one workbook, loaded into memory.
pub struct SpreadsheetReader {
    path: PathBuf,
    sheet_names: Vec<String>,
    range: Range<Data>,
}

impl SpreadsheetReader {
    /// Open with the format implied by the file extension.
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet_names = workbook.sheet_names();
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SheetError::NoWorksheet)??;
        debug!(
            "Opened '{}' by extension: {} sheet(s), first sheet {}x{}",
            path.display(),
            sheet_names.len(),
            range.height(),
            range.width()
        );
        Ok(Self {
            path: path.to_path_buf(),
            sheet_names,
            range,
        })
    }

    /// Open with the format detected from the file contents.
    pub fn open_sniffed(path: &Path) -> Result<Self, SheetError> {
        let bytes = std::fs::read(path)?;
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let sheet_names = workbook.sheet_names();
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SheetError::NoWorksheet)??;
        debug!(
            "Opened '{}' by content sniffing: first sheet {}x{}",
            path.display(),
            range.height(),
            range.width()
        );
        Ok(Self {
            path: path.to_path_buf(),
            sheet_names,
            range,
        })
    }

    /// Open by extension, falling back to content sniffing.
    pub fn open_with_fallback(path: &Path) -> Result<Self, SheetError> {
        Self::open(path).or_else(|primary| {
            debug!("Extension-based open failed ({primary}); sniffing content");
            Self::open_sniffed(path)
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Structural scan: the largest 1-based row and column holding a value.
    pub fn content_range(&self) -> ContentRange {
        let (row0, col0) = self
            .range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        self.range
            .used_cells()
            .filter(|(_, _, cell)| !matches!(cell, Data::Empty))
            .fold(
                ContentRange {
                    last_row: 0,
                    last_col: 0,
                },
                |acc, (r, c, _)| ContentRange {
                    last_row: acc.last_row.max(row0 + r + 1),
                    last_col: acc.last_col.max(col0 + c + 1),
                },
            )
    }

    /// Read the used area as text, first row as header.
    pub fn table(&self) -> Result<TabularData, SheetError> {
        if self.range.is_empty() || self.range.width() == 0 {
            return Err(SheetError::EmptySheet);
        }
        let rows = self
            .range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        let table = TabularData::from_rows(rows);
        if table.column_count() == 0 {
            return Err(SheetError::EmptySheet);
        }
        Ok(table)
    }
}

/// Plain textual form of a cell. Dates are shown as `YYYY-MM-DD HH:MM:SS`
/// rather than their serial number.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => other.to_string(),
    }
}
