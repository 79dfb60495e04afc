//! Result types returned by the conversion entry points.

use crate::pipeline::sheet::ContentRange;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a successful conversion produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Where the PNG was written. The caller owns deletion.
    pub screenshot_path: PathBuf,
    /// Advisory bounding range of the first sheet; `None` when detection
    /// failed on every strategy.
    pub content_range: Option<ContentRange>,
    /// Data rows rendered (header excluded).
    pub rows: usize,
    /// Columns rendered.
    pub columns: usize,
    /// Pixel width of the written image.
    pub image_width: u32,
    /// Pixel height of the written image.
    pub image_height: u32,
    pub stats: ConversionStats,
}

/// Per-stage wall-clock timings, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub input_duration_ms: u64,
    pub range_check_duration_ms: u64,
    pub render_duration_ms: u64,
    /// Browser launch, layout, screenshot and teardown.
    pub capture_duration_ms: u64,
    pub verify_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Size of the generated markup document.
    pub document_bytes: usize,
    /// Size of the written image.
    pub image_bytes: u64,
}

/// What [`crate::convert::inspect`] reports about a workbook. No browser
/// is involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub path: PathBuf,
    /// All worksheet names, in workbook order. Only the first is rendered.
    pub sheet_names: Vec<String>,
    pub content_range: ContentRange,
    /// Data rows the renderer would emit (header excluded).
    pub rows: usize,
    pub columns: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_serialises_with_range() {
        let out = ConversionOutput {
            screenshot_path: "screenshots/budget_0a1b2c3d.png".into(),
            content_range: Some(ContentRange {
                last_row: 3,
                last_col: 2,
            }),
            rows: 2,
            columns: 2,
            image_width: 180,
            image_height: 110,
            stats: ConversionStats {
                total_duration_ms: 900,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["content_range"]["last_row"], 3);
        assert_eq!(json["image_width"], 180);
        assert_eq!(json["stats"]["total_duration_ms"], 900);
    }

    #[test]
    fn absent_range_serialises_as_null() {
        let out = ConversionOutput {
            screenshot_path: "x.png".into(),
            content_range: None,
            rows: 0,
            columns: 1,
            image_width: 1,
            image_height: 1,
            stats: ConversionStats::default(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["content_range"].is_null());
    }
}
