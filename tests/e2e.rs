//! End-to-end tests against a real headless Chrome.
//!
//! Gated behind the `E2E_ENABLED` environment variable, and skipped when no
//! Chrome/Chromium executable can be located.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! In a container running as root, also set `SHEETSHOT_E2E_NO_SANDBOX=1`.

use async_trait::async_trait;
use rust_xlsxwriter::Workbook;
use sheetshot::{
    convert, render_table, CaptureInfo, ChromiumEngine, ConversionConfig, RenderOptions,
    RenderingEngine, ScreenshotCapture, SheetShotError, TabularData,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E is enabled and a browser is installed.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if !chrome_locate::is_chrome_available() {
            println!("SKIP: no Chrome/Chromium found (set SHEETSHOT_CHROME)");
            return;
        }
    }};
}

fn base_config(out: &Path, timeout_secs: u64) -> ConversionConfig {
    ConversionConfig::builder()
        .output_dir(out)
        .wait_timeout_secs(timeout_secs)
        .sandbox(std::env::var("SHEETSHOT_E2E_NO_SANDBOX").is_err())
        .build()
        .unwrap()
}

fn grid(rows: usize, cols: usize) -> TabularData {
    let mut all = vec![(0..cols).map(|c| format!("Column {c}")).collect::<Vec<_>>()];
    for r in 0..rows {
        all.push((0..cols).map(|c| format!("r{r}c{c} value")).collect());
    }
    TabularData::from_rows(all)
}

/// The PNG must match the measured element box, give or take rounding.
fn assert_image_matches_box(path: &Path, info: CaptureInfo) {
    let (w, h) = image::image_dimensions(path).expect("decodable PNG");
    println!(
        "box {:.1}×{:.1} css px → image {w}×{h} px",
        info.width, info.height
    );
    assert!((w as f64 - info.width).abs() <= 1.0, "width {w} vs box {}", info.width);
    assert!((h as f64 - info.height).abs() <= 1.0, "height {h} vs box {}", info.height);
}

/// Asks the inner engine for an element id the document does not contain.
struct MisdirectedEngine(ChromiumEngine);

#[async_trait]
impl RenderingEngine for MisdirectedEngine {
    async fn capture_element(
        &self,
        html: &str,
        _element_id: &str,
        output: &Path,
    ) -> Result<CaptureInfo, SheetShotError> {
        self.0.capture_element(html, "no-such-table", output).await
    }
}

// ── Capture ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_small_table_is_cropped_to_box() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let engine = ChromiumEngine::from_config(&base_config(dir.path(), 10));
    let doc = render_table(&grid(2, 2), &RenderOptions::default());
    let out = dir.path().join("small.png");

    let info = engine
        .capture_element(doc.as_str(), doc.element_id(), &out)
        .await
        .expect("capture should succeed");

    assert!(info.width < 1200.0 && info.height < 800.0);
    assert_image_matches_box(&out, info);
}

#[tokio::test]
async fn test_large_table_exceeds_viewport() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let engine = ChromiumEngine::from_config(&base_config(dir.path(), 10));
    let doc = render_table(&grid(120, 18), &RenderOptions::default());
    let out = dir.path().join("large.png");

    let info = engine
        .capture_element(doc.as_str(), doc.element_id(), &out)
        .await
        .expect("capture should succeed");

    assert!(info.width > 1200.0, "table should be wider than the viewport");
    assert!(info.height > 800.0, "table should be taller than the viewport");
    assert_image_matches_box(&out, info);
}

#[test]
fn test_missing_element_returns_false_within_timeout() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let engine = ChromiumEngine::from_config(&base_config(dir.path(), 2));
    let capture = ScreenshotCapture::new(Arc::new(MisdirectedEngine(engine)));
    let doc = render_table(&grid(1, 1), &RenderOptions::default());

    let started = Instant::now();
    let ok = capture.capture(&doc, &dir.path().join("never.png"));
    let elapsed = started.elapsed();

    assert!(!ok);
    // Wait bound plus browser launch and teardown.
    assert!(elapsed < Duration::from_secs(2 + 20), "took {elapsed:?}");
    assert!(!dir.path().join("never.png").exists());
}

// ── Full pipeline ────────────────────────────────────────────────────────────

#[test]
fn test_convert_workbook_end_to_end() {
    e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();

    let mut wb = Workbook::new();
    let sheet = wb.add_worksheet();
    sheet.write_string(0, 0, "Item").unwrap();
    sheet.write_string(0, 1, "Price").unwrap();
    sheet.write_string(1, 0, "Coffee & cake").unwrap();
    sheet.write_number(1, 1, 4.5).unwrap();
    sheet.write_string(2, 0, "<b>Tea</b>").unwrap();
    sheet.write_number(2, 1, 2.0).unwrap();
    let input: PathBuf = dir.path().join("menu.xlsx");
    wb.save(&input).unwrap();

    let config = base_config(&dir.path().join("screenshots"), 10);
    let first = convert(&input, &config).expect("conversion should succeed");
    let (w, h) = image::image_dimensions(&first).unwrap();
    assert!(w > 0 && h > 0);
    println!("{} → {w}×{h}", first.display());

    std::fs::remove_file(&first).unwrap();
    let second = convert(&input, &config).expect("rerun should succeed");
    assert_ne!(first, second);
}
