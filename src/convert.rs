//! Conversion entry points: one spreadsheet in, one PNG out.
//!
//! The pipeline is linear with no retries:
//!
//! ```text
//! Input ─▶ RangeCheck (advisory) ─▶ Render ─▶ Capture ─▶ Verify
//! ```
//!
//! A fatal error at any stage ends the conversion; later stages never run.
//! A range-check failure is logged and ignored.
//!
//! Three shapes of the same call are offered:
//!
//! * [`convert_async`]: the typed, async implementation.
//! * [`convert_sync`]: blocks on a private current-thread runtime.
//! * [`convert`]: blocking, returning the screenshot path or `None` with the
//!   cause logged. Suited to request handlers that only show a generic
//!   "could not process file" message.

use crate::config::ConversionConfig;
use crate::error::SheetShotError;
use crate::output::{ConversionOutput, ConversionStats, SheetSummary};
use crate::pipeline::capture::{current_thread_runtime, ScreenshotCapture};
use crate::pipeline::sheet::{ContentRange, SpreadsheetReader};
use crate::pipeline::table::RenderOptions;
use crate::pipeline::{artifact, input, range, table};
use crate::progress::{ProgressCallback, Stage};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Convert the first sheet of `input` to a PNG, returning its path.
///
/// Blocking. Returns `None` on any failure and logs the cause with its
/// stage. Must not be called from inside an async runtime; use
/// [`convert_async`] there.
pub fn convert(input: impl AsRef<Path>, config: &ConversionConfig) -> Option<PathBuf> {
    let input = input.as_ref();
    match convert_sync(input, config) {
        Ok(output) => Some(output.screenshot_path),
        Err(e) => {
            error!(
                stage = %e.stage(),
                "Could not process '{}': {e}",
                input.display()
            );
            None
        }
    }
}

/// Synchronous wrapper around [`convert_async`].
///
/// Creates a temporary current-thread tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SheetShotError> {
    current_thread_runtime()?.block_on(convert_async(input, config))
}

/// Convert the first sheet of `input` to a PNG in `config.output_dir`.
///
/// # Errors
/// Every fatal condition: invalid input, unreadable or empty sheet, browser
/// unavailable, element wait timed out, artifact missing after capture.
pub async fn convert_async(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SheetShotError> {
    let input = input.as_ref();
    info!("Starting conversion: {}", input.display());

    let result = run(input, config).await;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(result.is_ok());
    }
    result
}

/// Convert and move the screenshot to `output_path`.
///
/// Parent directories are created. The move is a rename when possible and a
/// copy + remove across file systems.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SheetShotError> {
    let mut output = convert_async(input, config).await?;
    let target = output_path.as_ref();

    artifact::move_artifact(&output.screenshot_path, target).await?;
    debug!(
        "Moved {} → {}",
        output.screenshot_path.display(),
        target.display()
    );
    output.screenshot_path = target.to_path_buf();
    Ok(output)
}

/// Describe a workbook without rendering it.
///
/// Does not require a browser.
pub async fn inspect(input: impl AsRef<Path>) -> Result<SheetSummary, SheetShotError> {
    let path = input.as_ref().to_path_buf();
    if !path.is_file() {
        return Err(SheetShotError::FileNotFound { path });
    }

    tokio::task::spawn_blocking(move || {
        let reader =
            SpreadsheetReader::open_with_fallback(&path).map_err(|e| e.into_fatal(&path))?;
        let content_range = reader.content_range();
        let (rows, columns) = match reader.table() {
            Ok(t) => (t.row_count(), t.column_count()),
            Err(_) => (0, 0),
        };
        Ok(SheetSummary {
            path: reader.path().to_path_buf(),
            sheet_names: reader.sheet_names().to_vec(),
            content_range,
            rows,
            columns,
        })
    })
    .await
    .map_err(|e| SheetShotError::Internal(format!("Inspect task panicked: {e}")))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    input_path: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SheetShotError> {
    let total_start = Instant::now();
    let progress = StageReporter::new(config.progress_callback.as_ref());
    let mut stats = ConversionStats::default();

    // ── Step 1: Validate input ───────────────────────────────────────────
    let started = progress.start(Stage::Input);
    let validated = input::validate_input(input_path, config)
        .map_err(|e| progress.fail(Stage::Input, e))?;
    stats.input_duration_ms = progress.complete(Stage::Input, started);
    let path = validated.path;

    // ── Step 2: Advisory range check ─────────────────────────────────────
    let started = progress.start(Stage::RangeCheck);
    let content_range = detect_range(&path).await;
    stats.range_check_duration_ms = progress.complete(Stage::RangeCheck, started);

    // ── Step 3: Render markup ────────────────────────────────────────────
    let started = progress.start(Stage::Render);
    let options = RenderOptions::from(config);
    let render_path = path.clone();
    let document = tokio::task::spawn_blocking(move || table::render(&render_path, &options))
        .await
        .map_err(|e| SheetShotError::Internal(format!("Render task panicked: {e}")))
        .and_then(|r| r)
        .map_err(|e| progress.fail(Stage::Render, e))?;
    stats.render_duration_ms = progress.complete(Stage::Render, started);
    stats.document_bytes = document.as_str().len();
    info!(
        "Rendered {} data rows × {} columns",
        document.row_count(),
        document.column_count()
    );

    // ── Step 4: Capture ──────────────────────────────────────────────────
    let started = progress.start(Stage::Capture);
    artifact::ensure_output_dir(&config.output_dir)
        .await
        .map_err(|e| progress.fail(Stage::Capture, e))?;
    let screenshot_path = artifact::screenshot_path(&config.output_dir, &path);

    let capture = ScreenshotCapture::from_config(config);
    debug!("Capturing with engine '{}'", capture.engine_name());
    if let Err(e) = capture.capture_async(&document, &screenshot_path).await {
        remove_partial(&screenshot_path).await;
        return Err(progress.fail(Stage::Capture, e));
    }
    stats.capture_duration_ms = progress.complete(Stage::Capture, started);

    // ── Step 5: Verify artifact ──────────────────────────────────────────
    let started = progress.start(Stage::Verify);
    let (image_width, image_height) = match artifact::verify_artifact(&screenshot_path) {
        Ok(dims) => dims,
        Err(e) => {
            remove_partial(&screenshot_path).await;
            return Err(progress.fail(Stage::Verify, e));
        }
    };
    stats.image_bytes = tokio::fs::metadata(&screenshot_path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    stats.verify_duration_ms = progress.complete(Stage::Verify, started);
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} ({}×{} px) in {}ms",
        screenshot_path.display(),
        image_width,
        image_height,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        screenshot_path,
        content_range,
        rows: document.row_count(),
        columns: document.column_count(),
        image_width,
        image_height,
        stats,
    })
}

/// Range detection off the async workers. A panicked task counts as a
/// failed detection.
async fn detect_range(path: &Path) -> Option<ContentRange> {
    let path = path.to_path_buf();
    match tokio::task::spawn_blocking(move || range::detect(&path)).await {
        Ok(range) => range,
        Err(e) => {
            warn!("Range detection task panicked: {e}");
            None
        }
    }
}

/// Drop whatever a failed capture left behind.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial artifact {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial artifact {}: {e}", path.display()),
    }
}

/// Forwards stage events to the optional callback and times each stage.
struct StageReporter<'a> {
    callback: Option<&'a ProgressCallback>,
}

impl<'a> StageReporter<'a> {
    fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self { callback }
    }

    fn start(&self, stage: Stage) -> Instant {
        debug!("Stage {stage} started");
        if let Some(cb) = self.callback {
            cb.on_stage_start(stage);
        }
        Instant::now()
    }

    fn complete(&self, stage: Stage, started: Instant) -> u64 {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!("Stage {stage} finished in {elapsed_ms}ms");
        if let Some(cb) = self.callback {
            cb.on_stage_complete(stage, elapsed_ms);
        }
        elapsed_ms
    }

    fn fail(&self, stage: Stage, err: SheetShotError) -> SheetShotError {
        warn!(stage = %err.stage(), "Stage {stage} failed: {err}");
        if let Some(cb) = self.callback {
            cb.on_stage_error(stage, &err.to_string());
        }
        err
    }
}
