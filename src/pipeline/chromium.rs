//! Headless Chrome engine: one private browser process per capture.
//!
//! Each call launches Chrome with a throwaway profile directory, loads the
//! document with `set_content` (no navigation, no network), polls for the
//! table element until the wait timeout, measures its box and captures a PNG
//! clipped to that box. Clipping with capture-beyond-viewport means a table
//! taller or wider than the 1200×800 viewport is still captured whole, and a
//! small table produces a small image with no surrounding whitespace.
//!
//! The browser is closed on every exit path. Layout (auto column widths,
//! border collapsing, no-wrap text) is left to the browser entirely.

use crate::config::ConversionConfig;
use crate::error::SheetShotError;
use crate::pipeline::capture::{CaptureInfo, RenderingEngine};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport as ClipRect};
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Launches a fresh headless Chrome for every capture.
#[derive(Debug, Clone)]
pub struct ChromiumEngine {
    executable: Option<PathBuf>,
    viewport_width: u32,
    viewport_height: u32,
    wait_timeout: Duration,
    sandbox: bool,
}

impl Default for ChromiumEngine {
    fn default() -> Self {
        Self::from_config(&ConversionConfig::default())
    }
}

impl ChromiumEngine {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            executable: config.browser_executable.clone(),
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
            sandbox: config.sandbox,
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Explicit path, else discovered, else left to the driver's own lookup.
    fn resolve_executable(&self) -> Option<PathBuf> {
        if let Some(ref p) = self.executable {
            return Some(p.clone());
        }
        match chrome_locate::locate_chrome() {
            Ok(p) => Some(p),
            Err(e) => {
                debug!("chrome-locate found nothing ({e}); using driver default lookup");
                None
            }
        }
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig, SheetShotError> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.viewport_width, self.viewport_height)
            .viewport(Viewport {
                width: self.viewport_width,
                height: self.viewport_height,
                device_scale_factor: Some(1.0),
                ..Viewport::default()
            })
            .user_data_dir(profile_dir)
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--disable-extensions");

        if let Some(exe) = self.resolve_executable() {
            builder = builder.chrome_executable(exe);
        }
        if !self.sandbox {
            builder = builder.no_sandbox();
        }

        builder
            .build()
            .map_err(|detail| SheetShotError::CaptureUnavailable { detail })
    }

    /// Everything between launch and close. Errors here still reach teardown.
    async fn run_session(
        &self,
        browser: &Browser,
        html: &str,
        element_id: &str,
        output: &Path,
    ) -> Result<CaptureInfo, SheetShotError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SheetShotError::CaptureUnavailable {
                detail: format!("could not open page: {e}"),
            })?;

        page.set_content(html)
            .await
            .map_err(|e| SheetShotError::CaptureFailed {
                detail: format!("could not load document: {e}"),
            })?;

        let selector = id_selector(element_id);
        let started = Instant::now();
        let element = tokio::time::timeout(self.wait_timeout, wait_for_element(&page, &selector))
            .await
            .map_err(|_| SheetShotError::CaptureTimeout {
                element_id: element_id.to_string(),
                secs: self.wait_timeout.as_secs(),
            })?;
        debug!(
            "Element {selector} attached after {}ms",
            started.elapsed().as_millis()
        );

        let bounds = element
            .bounding_box()
            .await
            .map_err(|e| SheetShotError::ElementMissing {
                element_id: element_id.to_string(),
                detail: e.to_string(),
            })?;
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return Err(SheetShotError::ElementMissing {
                element_id: element_id.to_string(),
                detail: format!("zero-size box {}×{}", bounds.width, bounds.height),
            });
        }

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(ClipRect {
                x: bounds.x,
                y: bounds.y,
                width: bounds.width,
                height: bounds.height,
                scale: 1.0,
            })
            .capture_beyond_viewport(true)
            .build();

        page.save_screenshot(params, output)
            .await
            .map_err(|e| SheetShotError::CaptureFailed {
                detail: format!("could not write '{}': {e}", output.display()),
            })?;

        Ok(CaptureInfo {
            width: bounds.width,
            height: bounds.height,
        })
    }
}

#[async_trait]
impl RenderingEngine for ChromiumEngine {
    async fn capture_element(
        &self,
        html: &str,
        element_id: &str,
        output: &Path,
    ) -> Result<CaptureInfo, SheetShotError> {
        // Private profile: concurrent captures never share browser state.
        let profile = tempfile::Builder::new()
            .prefix("sheetshot-chrome-")
            .tempdir()
            .map_err(|e| SheetShotError::CaptureUnavailable {
                detail: format!("could not create browser profile dir: {e}"),
            })?;

        let config = self.browser_config(profile.path())?;
        let launch_start = Instant::now();
        let (mut browser, handler) =
            Browser::launch(config)
                .await
                .map_err(|e| SheetShotError::CaptureUnavailable {
                    detail: format!("browser launch failed: {e}"),
                })?;
        info!(
            "Headless browser launched in {}ms",
            launch_start.elapsed().as_millis()
        );

        let handler_task = tokio::spawn(async move {
            drain_events(handler).await;
        });

        let result = self.run_session(&browser, html, element_id, output).await;

        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {e}");
        }
        if let Err(e) = browser.wait().await {
            warn!("Browser process wait failed: {e}");
        }
        handler_task.abort();

        result
    }

    fn name(&self) -> &str {
        "chromium"
    }
}

/// Drive the DevTools event stream until the browser connection closes.
/// Event errors, such as messages the driver cannot decode, are logged and
/// skipped. Returns the number of events seen.
async fn drain_events<S, T, E>(events: S) -> usize
where
    S: Stream<Item = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut events = std::pin::pin!(events);
    let mut seen = 0;
    while let Some(event) = events.next().await {
        seen += 1;
        if let Err(e) = event {
            debug!("Ignoring browser event error: {e}");
        }
    }
    seen
}

/// Poll until the element exists. Unbounded; callers wrap it in a timeout.
async fn wait_for_element(page: &Page, selector: &str) -> Element {
    loop {
        match page.find_element(selector).await {
            Ok(element) => return element,
            Err(_) => tokio::time::sleep(POLL_INTERVAL).await,
        }
    }
}

/// Attribute selector for an element id. Unlike `#id` it needs no CSS
/// escaping for ids that start with a digit or contain punctuation.
fn id_selector(element_id: &str) -> String {
    format!(
        "[id=\"{}\"]",
        element_id.replace('\\', "\\\\").replace('"', "\\\"")
    )
}
