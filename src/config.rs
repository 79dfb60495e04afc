//! Configuration types for spreadsheet-to-image conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads and to log exactly what a
//! request ran with.

use crate::error::SheetShotError;
use crate::pipeline::capture::RenderingEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default identifier of the table element used as the screenshot crop target.
pub const DEFAULT_TABLE_ID: &str = "excel-table";

/// Configuration for a spreadsheet-to-image conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use sheetshot::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .output_dir("/tmp/shots")
///     .viewport(1400, 900)
///     .wait_timeout_secs(5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory that receives screenshot artifacts. Created on demand.
    /// Default: `screenshots`.
    pub output_dir: PathBuf,

    /// Browser viewport width in CSS pixels. Default: 1200.
    ///
    /// Wide enough that typical tables lay out without a horizontal
    /// scrollbar. The captured image is cropped to the table, so this never
    /// limits the output size.
    pub viewport_width: u32,

    /// Browser viewport height in CSS pixels. Default: 800.
    pub viewport_height: u32,

    /// Seconds to wait for the table element to attach. Default: 10.
    pub wait_timeout_secs: u64,

    /// `id` attribute of the rendered table element. Default: `excel-table`.
    pub table_id: String,

    /// How cell text is inserted into the markup. Default: [`CellMarkup::Escaped`].
    pub cell_markup: CellMarkup,

    /// Accepted input extensions, lower-case, without the dot.
    /// Default: `xlsx`, `xls`.
    pub allowed_extensions: Vec<String>,

    /// Maximum accepted input size in bytes. Default: 16 MiB.
    pub max_input_bytes: u64,

    /// Explicit Chrome/Chromium executable. If None, discovered at launch.
    pub browser_executable: Option<PathBuf>,

    /// Run the browser with its sandbox enabled. Default: true.
    ///
    /// Containers running as root usually need this off.
    pub sandbox: bool,

    /// Pre-constructed rendering engine. Takes precedence over the
    /// browser settings above.
    pub engine: Option<Arc<dyn RenderingEngine>>,

    /// Optional stage-progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("screenshots"),
            viewport_width: 1200,
            viewport_height: 800,
            wait_timeout_secs: 10,
            table_id: DEFAULT_TABLE_ID.to_string(),
            cell_markup: CellMarkup::default(),
            allowed_extensions: vec!["xlsx".to_string(), "xls".to_string()],
            max_input_bytes: 16 * 1024 * 1024,
            browser_executable: None,
            sandbox: true,
            engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("output_dir", &self.output_dir)
            .field("viewport_width", &self.viewport_width)
            .field("viewport_height", &self.viewport_height)
            .field("wait_timeout_secs", &self.wait_timeout_secs)
            .field("table_id", &self.table_id)
            .field("cell_markup", &self.cell_markup)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("max_input_bytes", &self.max_input_bytes)
            .field("browser_executable", &self.browser_executable)
            .field("sandbox", &self.sandbox)
            .field("engine", &self.engine.as_ref().map(|_| "<dyn RenderingEngine>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `extension` (any case, no dot) is an accepted input type.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        let ext = extension.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|a| *a == ext)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width.clamp(100, 10_000);
        self.config.viewport_height = height.clamp(100, 10_000);
        self
    }

    pub fn wait_timeout_secs(mut self, secs: u64) -> Self {
        self.config.wait_timeout_secs = secs;
        self
    }

    pub fn table_id(mut self, id: impl Into<String>) -> Self {
        self.config.table_id = id.into();
        self
    }

    pub fn cell_markup(mut self, markup: CellMarkup) -> Self {
        self.config.cell_markup = markup;
        self
    }

    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn max_input_bytes(mut self, bytes: u64) -> Self {
        self.config.max_input_bytes = bytes;
        self
    }

    pub fn browser_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_executable = Some(path.into());
        self
    }

    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.config.sandbox = enabled;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn RenderingEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, SheetShotError> {
        let c = &self.config;
        if c.wait_timeout_secs == 0 {
            return Err(SheetShotError::InvalidConfig(
                "Wait timeout must be ≥ 1 second".into(),
            ));
        }
        if c.table_id.is_empty() || c.table_id.chars().any(char::is_whitespace) {
            return Err(SheetShotError::InvalidConfig(format!(
                "Table id must be non-empty and contain no whitespace, got {:?}",
                c.table_id
            )));
        }
        if c.allowed_extensions.is_empty() {
            return Err(SheetShotError::InvalidConfig(
                "At least one input extension must be allowed".into(),
            ));
        }
        if c.max_input_bytes == 0 {
            return Err(SheetShotError::InvalidConfig(
                "Maximum input size must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How spreadsheet text is placed into the rendered markup.
///
/// | Variant | Effect |
/// |---------|--------|
/// | `Escaped` | `& < > " '` become entities; the image shows the literal text (default) |
/// | `Raw` | text is inserted verbatim, so light markup such as `<b>` renders |
///
/// `Raw` lets a workbook inject arbitrary markup into the page the browser
/// loads. Only use it for trusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellMarkup {
    #[default]
    Escaped,
    Raw,
}
