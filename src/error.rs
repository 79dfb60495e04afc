//! Error types for the sheetshot library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`SheetShotError`]: **Fatal**: the conversion cannot produce an image
//!   (bad input file, empty sheet, browser unavailable, element never
//!   attached). Returned as `Err(SheetShotError)` from the typed `convert_*`
//!   functions and collapsed to `None` by [`crate::convert::convert`].
//!
//! * [`DetectionError`]: **Non-fatal**: content-range detection failed on
//!   every strategy. Detection is advisory; the error is logged and the
//!   pipeline carries on without a range.
//!
//! * [`SheetError`]: reader-level failure from the spreadsheet backend,
//!   wrapped into one of the above by the caller.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the sheetshot library.
#[derive(Debug, Error)]
pub enum SheetShotError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Spreadsheet not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// File extension is not one of the configured spreadsheet formats.
    #[error("Unsupported file type '{extension}' for '{path}' (allowed: {allowed})")]
    UnsupportedFormat {
        path: PathBuf,
        extension: String,
        allowed: String,
    },

    /// File exceeds the configured size cap.
    #[error("File '{path}' is {size} bytes, over the {limit}-byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// File exists but contains no bytes.
    #[error("File '{path}' is empty")]
    EmptyFile { path: PathBuf },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The workbook could not be parsed by any reader strategy.
    #[error("Could not read spreadsheet '{path}': {detail}")]
    Unreadable { path: PathBuf, detail: String },

    /// The workbook has no worksheets at all.
    #[error("Workbook '{path}' contains no worksheets")]
    NoWorksheet { path: PathBuf },

    /// The first worksheet has no columns to render.
    #[error("First worksheet of '{path}' is empty (zero columns)")]
    EmptySheet { path: PathBuf },

    // ── Capture errors ────────────────────────────────────────────────────
    /// The table element did not attach to the page in time.
    #[error("Timed out after {secs}s waiting for element '#{element_id}'")]
    CaptureTimeout { element_id: String, secs: u64 },

    /// The headless browser or its page could not be started.
    #[error("Rendering engine unavailable: {detail}")]
    CaptureUnavailable { detail: String },

    /// The element was reported attached but could not be measured.
    #[error("Element '#{element_id}' could not be located after wait: {detail}")]
    ElementMissing { element_id: String, detail: String },

    /// The browser failed while rasterising or writing the screenshot.
    #[error("Screenshot capture failed: {detail}")]
    CaptureFailed { detail: String },

    // ── Artifact errors ───────────────────────────────────────────────────
    /// Capture reported success but the file is absent, empty or undecodable.
    #[error("Screenshot artifact missing or invalid at '{path}': {detail}")]
    ArtifactMissing { path: PathBuf, detail: String },

    /// Could not create the output directory or move the artifact.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Pipeline stage a fatal error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureStage {
    Input,
    Render,
    Capture,
    Artifact,
    Config,
    Internal,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureStage::Input => "input",
            FailureStage::Render => "render",
            FailureStage::Capture => "capture",
            FailureStage::Artifact => "artifact",
            FailureStage::Config => "config",
            FailureStage::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl SheetShotError {
    /// Classify the error by the pipeline stage that raised it.
    pub fn stage(&self) -> FailureStage {
        match self {
            SheetShotError::FileNotFound { .. }
            | SheetShotError::PermissionDenied { .. }
            | SheetShotError::UnsupportedFormat { .. }
            | SheetShotError::FileTooLarge { .. }
            | SheetShotError::EmptyFile { .. } => FailureStage::Input,
            SheetShotError::Unreadable { .. }
            | SheetShotError::NoWorksheet { .. }
            | SheetShotError::EmptySheet { .. } => FailureStage::Render,
            SheetShotError::CaptureTimeout { .. }
            | SheetShotError::CaptureUnavailable { .. }
            | SheetShotError::ElementMissing { .. }
            | SheetShotError::CaptureFailed { .. } => FailureStage::Capture,
            SheetShotError::ArtifactMissing { .. } | SheetShotError::OutputWriteFailed { .. } => {
                FailureStage::Artifact
            }
            SheetShotError::InvalidConfig(_) => FailureStage::Config,
            SheetShotError::Internal(_) => FailureStage::Internal,
        }
    }
}

/// Reader-level failure from the spreadsheet backend.
#[derive(Debug, Error)]
pub enum SheetError {
    /// calamine rejected the file.
    #[error("{0}")]
    Calamine(#[from] calamine::Error),

    /// The file could not be read from disk.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The workbook has no sheets.
    #[error("workbook has no worksheets")]
    NoWorksheet,

    /// The first sheet has no columns.
    #[error("worksheet is empty")]
    EmptySheet,
}

impl SheetError {
    /// Attach the input path and lift into the fatal error type.
    pub fn into_fatal(self, path: impl Into<PathBuf>) -> SheetShotError {
        let path = path.into();
        match self {
            SheetError::NoWorksheet => SheetShotError::NoWorksheet { path },
            SheetError::EmptySheet => SheetShotError::EmptySheet { path },
            other => SheetShotError::Unreadable {
                path,
                detail: other.to_string(),
            },
        }
    }
}

/// Both content-range strategies failed.
#[derive(Debug, Clone, Error)]
#[error("content range unavailable (structural scan: {primary}; tabular read: {fallback})")]
pub struct DetectionError {
    pub primary: String,
    pub fallback: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_timeout_display() {
        let e = SheetShotError::CaptureTimeout {
            element_id: "excel-table".into(),
            secs: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("10s"), "got: {msg}");
        assert!(msg.contains("#excel-table"), "got: {msg}");
    }

    #[test]
    fn unsupported_format_lists_allowed() {
        let e = SheetShotError::UnsupportedFormat {
            path: "notes.txt".into(),
            extension: "txt".into(),
            allowed: "xlsx, xls".into(),
        };
        assert!(e.to_string().contains("xlsx, xls"));
    }

    #[test]
    fn stages_cover_taxonomy() {
        assert_eq!(
            SheetShotError::EmptySheet { path: "a.xlsx".into() }.stage(),
            FailureStage::Render
        );
        assert_eq!(
            SheetShotError::CaptureUnavailable { detail: "no chrome".into() }.stage(),
            FailureStage::Capture
        );
        assert_eq!(
            SheetShotError::ArtifactMissing {
                path: "x.png".into(),
                detail: "absent".into()
            }
            .stage(),
            FailureStage::Artifact
        );
        assert_eq!(
            SheetShotError::EmptyFile { path: "a.xlsx".into() }.stage(),
            FailureStage::Input
        );
    }

    #[test]
    fn sheet_error_lifts_to_specific_variants() {
        assert!(matches!(
            SheetError::EmptySheet.into_fatal("a.xlsx"),
            SheetShotError::EmptySheet { .. }
        ));
        assert!(matches!(
            SheetError::NoWorksheet.into_fatal("a.xlsx"),
            SheetShotError::NoWorksheet { .. }
        ));
        let io = SheetError::Io(std::io::Error::other("boom"));
        match io.into_fatal("a.xlsx") {
            SheetShotError::Unreadable { detail, .. } => assert!(detail.contains("boom")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn detection_error_names_both_causes() {
        let e = DetectionError {
            primary: "zip".into(),
            fallback: "cfb".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("zip") && msg.contains("cfb"));
    }
}
