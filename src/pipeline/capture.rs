//! Screenshot capture: rasterise exactly the table element of a document.
//!
//! ## Why an engine trait?
//!
//! Every capture today launches and tears down its own headless browser
//! ([`crate::pipeline::chromium::ChromiumEngine`]). That keeps requests fully
//! isolated but costs a process launch each time. Putting the browser behind
//! [`RenderingEngine`] lets a pooled engine, or a fake in tests, slot in
//! without the pipeline noticing.
//!
//! ## Blocking boundary
//!
//! Browser automation is asynchronous. [`ScreenshotCapture::capture`] is the
//! explicit bridge for synchronous callers: it builds a single-threaded tokio
//! runtime, drives the engine on it, and returns a plain `bool`. The engine
//! bounds its own wait for the element, so the call always returns.

use crate::config::ConversionConfig;
use crate::error::SheetShotError;
use crate::pipeline::chromium::ChromiumEngine;
use crate::pipeline::table::RenderDocument;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Measured box of the captured element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureInfo {
    pub width: f64,
    pub height: f64,
}

/// Something that can lay out HTML and screenshot one element of it.
#[async_trait]
pub trait RenderingEngine: Send + Sync {
    /// Load `html`, wait for the element with id `element_id`, and write a
    /// PNG of exactly its bounding box to `output`.
    ///
    /// Implementations must release every resource they acquire on both the
    /// success and the error path, and must bound the element wait.
    async fn capture_element(
        &self,
        html: &str,
        element_id: &str,
        output: &Path,
    ) -> Result<CaptureInfo, SheetShotError>;

    /// Short label for logs.
    fn name(&self) -> &str {
        "engine"
    }
}

/// Front door for the capture stage.
#[derive(Clone)]
pub struct ScreenshotCapture {
    engine: Arc<dyn RenderingEngine>,
}

impl ScreenshotCapture {
    pub fn new(engine: Arc<dyn RenderingEngine>) -> Self {
        Self { engine }
    }

    /// Use the configured engine, or a fresh-browser-per-call Chromium engine.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let engine = match config.engine {
            Some(ref engine) => Arc::clone(engine),
            None => Arc::new(ChromiumEngine::from_config(config)) as Arc<dyn RenderingEngine>,
        };
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Capture `document`'s table to `output`, returning the measured box.
    pub async fn capture_async(
        &self,
        document: &RenderDocument,
        output: &Path,
    ) -> Result<CaptureInfo, SheetShotError> {
        let info = self
            .engine
            .capture_element(document.as_str(), document.element_id(), output)
            .await?;
        info!(
            "Captured #{} ({:.0}×{:.0} css px) → {}",
            document.element_id(),
            info.width,
            info.height,
            output.display()
        );
        Ok(info)
    }

    /// Blocking capture. Returns `false` (never panics) on any failure; the
    /// cause is logged.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`Self::capture_async`] there.
    pub fn capture(&self, document: &RenderDocument, output: &Path) -> bool {
        match self.capture_blocking(document, output) {
            Ok(_) => true,
            Err(e) => {
                error!(stage = %e.stage(), "Screenshot capture failed: {e}");
                false
            }
        }
    }

    /// Blocking capture with the typed error.
    pub fn capture_blocking(
        &self,
        document: &RenderDocument,
        output: &Path,
    ) -> Result<CaptureInfo, SheetShotError> {
        let runtime = current_thread_runtime()?;
        runtime.block_on(self.capture_async(document, output))
    }
}

/// A single-threaded runtime for bridging a synchronous caller into the
/// async engine. Refuses to nest inside an existing runtime.
pub(crate) fn current_thread_runtime() -> Result<tokio::runtime::Runtime, SheetShotError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(SheetShotError::Internal(
            "blocking call made from inside an async runtime; use the async variant".into(),
        ));
    }
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SheetShotError::Internal(format!("Failed to create tokio runtime: {e}")))
}
