//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages. The browser stage
//! dominates wall-clock time (process launch alone is hundreds of
//! milliseconds), so even a single-image conversion benefits from a spinner
//! that says what is happening.
//!
//! # Example
//!
//! ```rust
//! use sheetshot::{ConversionProgressCallback, ConversionConfig, Stage};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl ConversionProgressCallback for Logger {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Logger) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Path, extension and size checks.
    Input,
    /// Advisory content-range detection.
    RangeCheck,
    /// Spreadsheet → markup document.
    Render,
    /// Headless browser screenshot.
    Capture,
    /// Post-capture artifact check.
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Input => "input",
            Stage::RangeCheck => "range check",
            Stage::Render => "render",
            Stage::Capture => "capture",
            Stage::Verify => "verify",
        };
        f.write_str(s)
    }
}

/// Called by the conversion pipeline as it runs each stage.
///
/// Implementations must be `Send + Sync`: the spreadsheet stages run on the
/// blocking thread pool. All methods have default no-op implementations so
/// callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails fatally. No further stages run.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once at the end of every conversion.
    fn on_conversion_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage}"));
        }

        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.events.lock().unwrap().push(format!("done {stage}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events.lock().unwrap().push(format!("fail {stage}: {error}"));
        }

        fn on_conversion_complete(&self, success: bool) {
            self.events.lock().unwrap().push(format!("complete {success}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Input);
        cb.on_stage_complete(Stage::Input, 3);
        cb.on_stage_error(Stage::Capture, "timeout");
        cb.on_conversion_complete(false);
    }

    #[test]
    fn tracking_callback_receives_events_in_order() {
        let tracker = TrackingCallback::default();
        tracker.on_stage_start(Stage::Render);
        tracker.on_stage_complete(Stage::Render, 12);
        tracker.on_stage_start(Stage::Capture);
        tracker.on_stage_error(Stage::Capture, "browser missing");
        tracker.on_conversion_complete(false);

        let events = tracker.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start render",
                "done render",
                "start capture",
                "fail capture: browser missing",
                "complete false",
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::RangeCheck);
        cb.on_conversion_complete(true);
    }
}
