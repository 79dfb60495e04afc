//! Content-range detection: where does the data on the first sheet end?
//!
//! The result is advisory. Nothing downstream needs it; it exists as an early
//! integrity check on the upload and as a log line that tells an operator how
//! big the table about to be screenshotted is.

use crate::error::DetectionError;
use crate::pipeline::sheet::{ContentRange, SpreadsheetReader};
use std::path::Path;
use tracing::{info, warn};

/// Detect the bounding range of non-empty cells on the first worksheet.
///
/// 1. Structural scan of every stored cell (extension-based open).
/// 2. On failure, a tabular read of the content-sniffed workbook, counting
///    the header row: `last_row = data_rows + 1`, `last_col = columns`.
///
/// Returns `None` only when both strategies fail; the causes are logged.
pub fn detect(path: &Path) -> Option<ContentRange> {
    match try_detect(path) {
        Ok(range) => Some(range),
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}

/// Like [`detect`], but hands back the failure causes instead of logging.
pub fn try_detect(path: &Path) -> Result<ContentRange, DetectionError> {
    let primary = match SpreadsheetReader::open(path) {
        Ok(reader) => {
            let range = reader.content_range();
            info!("Content range detected: {}", range.a1());
            return Ok(range);
        }
        Err(e) => e.to_string(),
    };
    warn!("Structural range scan failed for '{}': {primary}", path.display());

    match SpreadsheetReader::open_sniffed(path).and_then(|r| r.table()) {
        Ok(table) => {
            let range = ContentRange::from_table(&table);
            info!("Content range detected from tabular read: {}", range.a1());
            Ok(range)
        }
        Err(e) => Err(DetectionError {
            primary,
            fallback: e.to_string(),
        }),
    }
}
