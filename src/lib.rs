//! # sheetshot
//!
//! Turn the first worksheet of an `.xlsx`/`.xls` workbook into a PNG sized
//! exactly to the rendered table.
//!
//! ## Why a browser?
//!
//! Column auto-width, border collapsing and no-wrap text are layout problems
//! a browser already solves. This crate renders the sheet as a small styled
//! HTML table, loads it into headless Chrome, and screenshots just the table
//! element. The image is as large as the table and no larger, whether the
//! table fits the viewport or not.
//!
//! ## Pipeline Overview
//!
//! ```text
//! workbook
//!  │
//!  ├─ 1. Input       path, extension and size checks
//!  ├─ 2. RangeCheck  bounding range of non-empty cells (advisory, logged)
//!  ├─ 3. Render      first sheet → self-contained HTML (spawn_blocking)
//!  ├─ 4. Capture     headless Chrome, element-clipped PNG
//!  └─ 5. Verify      artifact exists and decodes; dimensions reported
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheetshot::{convert_async, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_async("report.xlsx", &config).await?;
//!     println!("{}", output.screenshot_path.display());
//!     Ok(())
//! }
//! ```
//!
//! From synchronous code, [`convert`] blocks and returns `Option<PathBuf>`:
//!
//! ```rust,no_run
//! let config = sheetshot::ConversionConfig::default();
//! match sheetshot::convert("report.xlsx", &config) {
//!     Some(path) => println!("{}", path.display()),
//!     None => eprintln!("could not process file"),
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sheetshot` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Requirements
//!
//! A Chrome or Chromium executable. It is found via `SHEETSHOT_CHROME`,
//! `CHROME`, `PATH`, well-known install locations, or the Playwright browser
//! cache; see the `chrome-locate` crate.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CellMarkup, ConversionConfig, ConversionConfigBuilder, DEFAULT_TABLE_ID};
pub use convert::{convert, convert_async, convert_sync, convert_to_file, inspect};
pub use error::{DetectionError, FailureStage, SheetError, SheetShotError};
pub use output::{ConversionOutput, ConversionStats, SheetSummary};
pub use pipeline::capture::{CaptureInfo, RenderingEngine, ScreenshotCapture};
pub use pipeline::chromium::ChromiumEngine;
pub use pipeline::range::detect;
pub use pipeline::sheet::{ContentRange, SpreadsheetReader, TabularData};
pub use pipeline::table::{render, render_table, RenderDocument, RenderOptions};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
