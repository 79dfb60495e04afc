//! Pipeline integration tests with a stand-in rendering engine.
//!
//! No browser is launched: [`PngEngine`] writes a PNG sized from the row and
//! column counts it finds in the markup. Everything else (input checks,
//! range detection, rendering, naming, verification) runs for real against
//! workbooks generated with `rust_xlsxwriter`.

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use rust_xlsxwriter::Workbook;
use sheetshot::{
    convert, convert_async, convert_sync, convert_to_file, detect, inspect, CaptureInfo,
    ContentRange, ConversionConfig, ConversionProgressCallback, RenderingEngine, SheetShotError,
    Stage,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route pipeline logs to the test harness. Set `RUST_LOG=sheetshot=debug`
/// to see them with `--nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fake layout: 100 px per column, 30 px per row (header included).
struct PngEngine {
    calls: AtomicUsize,
}

impl PngEngine {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RenderingEngine for PngEngine {
    async fn capture_element(
        &self,
        html: &str,
        element_id: &str,
        output: &Path,
    ) -> Result<CaptureInfo, SheetShotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !html.contains(&format!("id=\"{element_id}\"")) {
            return Err(SheetShotError::CaptureTimeout {
                element_id: element_id.to_string(),
                secs: 1,
            });
        }
        let rows = html.matches("<tr>").count() as u32;
        let header = html.split("</thead>").next().unwrap_or("");
        let cols = header.matches("<th>").count() as u32;
        let (w, h) = (cols.max(1) * 100, rows.max(1) * 30);

        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
            .save(output)
            .map_err(|e| SheetShotError::CaptureFailed {
                detail: e.to_string(),
            })?;
        Ok(CaptureInfo {
            width: w as f64,
            height: h as f64,
        })
    }

    fn name(&self) -> &str {
        "png-fake"
    }
}

#[derive(Default)]
struct StageLog {
    failures: Mutex<Vec<Stage>>,
    started: Mutex<Vec<Stage>>,
}

impl ConversionProgressCallback for StageLog {
    fn on_stage_start(&self, stage: Stage) {
        self.started.lock().unwrap().push(stage);
    }
    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.failures.lock().unwrap().push(stage);
    }
}

/// Header plus `rows` data rows across `cols` columns.
fn write_grid(dir: &Path, name: &str, rows: u32, cols: u16) -> PathBuf {
    init_tracing();
    let mut wb = Workbook::new();
    let sheet = wb.add_worksheet();
    for c in 0..cols {
        sheet.write_string(0, c, format!("Col {c}")).unwrap();
    }
    for r in 1..=rows {
        for c in 0..cols {
            sheet.write_number(r, c, (r * 10 + c as u32) as f64).unwrap();
        }
    }
    let path = dir.join(name);
    wb.save(&path).unwrap();
    path
}

fn config_with(out: &Path, engine: Arc<dyn RenderingEngine>) -> ConversionConfig {
    init_tracing();
    ConversionConfig::builder()
        .output_dir(out)
        .engine(engine)
        .build()
        .unwrap()
}

// ── Range detection ──────────────────────────────────────────────────────────

#[test]
fn range_matches_rectangle_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    for (rows, cols) in [(0u32, 1u16), (2, 2), (9, 5)] {
        let path = write_grid(dir.path(), &format!("g{rows}x{cols}.xlsx"), rows, cols);
        assert_eq!(
            detect(&path),
            Some(ContentRange {
                last_row: rows as usize + 1,
                last_col: cols as usize
            })
        );
    }
}

#[test]
fn range_is_absent_for_non_spreadsheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.xlsx");
    std::fs::write(&path, b"<html>not a workbook</html>").unwrap();
    assert_eq!(detect(&path), None);
}

// ── Blocking conversion ──────────────────────────────────────────────────────

#[test]
fn three_by_two_sheet_produces_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_grid(dir.path(), "team.xlsx", 2, 2);
    let out = dir.path().join("screenshots");
    let config = config_with(&out, PngEngine::new());

    let first = convert(&input, &config).expect("conversion should succeed");
    assert!(first.starts_with(&out));
    assert!(std::fs::metadata(&first).unwrap().len() > 0);
    assert_eq!(image::image_dimensions(&first).unwrap(), (200, 90));

    std::fs::remove_file(&first).unwrap();
    let second = convert(&input, &config).expect("rerun should succeed");
    assert_ne!(first, second);
    assert_eq!(image::image_dimensions(&second).unwrap(), (200, 90));
}

#[test]
fn zero_byte_input_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.xlsx");
    std::fs::write(&input, b"").unwrap();
    let engine = PngEngine::new();
    let config = config_with(&dir.path().join("out"), engine.clone());

    assert_eq!(convert(&input, &config), None);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn non_spreadsheet_input_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.xlsx");
    std::fs::write(&input, b"\x89PNG\r\n\x1a\nnot really").unwrap();
    let engine = PngEngine::new();
    let config = config_with(&dir.path().join("out"), engine.clone());

    assert_eq!(convert(&input, &config), None);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn typed_sync_error_names_render_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut wb = Workbook::new();
    wb.add_worksheet();
    let input = dir.path().join("blank.xlsx");
    wb.save(&input).unwrap();

    let engine = PngEngine::new();
    let log = Arc::new(StageLog::default());
    let config = ConversionConfig::builder()
        .output_dir(dir.path().join("out"))
        .engine(engine.clone())
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let err = convert_sync(&input, &config).unwrap_err();
    assert!(matches!(err, SheetShotError::EmptySheet { .. }), "got {err:?}");
    assert_eq!(*log.failures.lock().unwrap(), vec![Stage::Render]);
    assert!(!log.started.lock().unwrap().contains(&Stage::Capture));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

// ── Async conversion ─────────────────────────────────────────────────────────

#[tokio::test]
async fn blocking_convert_inside_runtime_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_grid(dir.path(), "t.xlsx", 1, 1);
    let engine = PngEngine::new();
    let config = config_with(&dir.path().join("out"), engine.clone());

    assert!(matches!(
        convert_sync(&input, &config),
        Err(SheetShotError::Internal(_))
    ));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_conversions_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_grid(dir.path(), "shared.xlsx", 3, 2);
    let config = config_with(&dir.path().join("out"), PngEngine::new());

    let runs = (0..8).map(|_| convert_async(&input, &config));
    let outputs = futures::future::join_all(runs).await;

    let mut paths: Vec<PathBuf> = outputs
        .into_iter()
        .map(|o| o.unwrap().screenshot_path)
        .collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 8);
}

#[tokio::test]
async fn output_reports_shape_and_timings() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_grid(dir.path(), "Quarterly Report.xlsx", 4, 3);
    let config = config_with(&dir.path().join("out"), PngEngine::new());

    let output = convert_async(&input, &config).await.unwrap();
    assert_eq!((output.rows, output.columns), (4, 3));
    assert_eq!((output.image_width, output.image_height), (300, 150));
    assert_eq!(output.content_range.map(|r| r.a1()), Some("A1:C5".to_string()));
    assert!(output.stats.document_bytes > 0);
    assert!(output.stats.image_bytes > 0);

    let name = output.screenshot_path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("Quarterly_Report_"), "got {name}");
    assert!(name.ends_with(".png"));
}

#[tokio::test]
async fn convert_to_file_moves_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_grid(dir.path(), "moved.xlsx", 2, 2);
    let out = dir.path().join("out");
    let config = config_with(&out, PngEngine::new());
    let target = dir.path().join("mail/attachment.png");

    let output = convert_to_file(&input, &target, &config).await.unwrap();
    assert_eq!(output.screenshot_path, target);
    assert!(target.exists());
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
}

#[tokio::test]
async fn inspect_needs_no_engine() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_grid(dir.path(), "inspect.xlsx", 5, 4);

    let summary = inspect(&input).await.unwrap();
    assert_eq!((summary.rows, summary.columns), (5, 4));
    assert_eq!(
        summary.content_range,
        ContentRange {
            last_row: 6,
            last_col: 4
        }
    );
}
