//! Pipeline stages for spreadsheet-to-PNG conversion.
//!
//! Each submodule implements one step. The browser sits behind the
//! [`capture::RenderingEngine`] trait so the other stages never see it.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌──▶ range (advisory, logged only)
//! input ─────┤
//! (checks)   └──▶ table ──▶ capture ──▶ artifact
//!                 (HTML)    (Chrome)    (verify PNG)
//! ```
//!
//! 1. [`input`]   : cheap path, extension and size checks before parsing
//! 2. [`range`]   : bounding range of non-empty cells; never gates rendering
//! 3. [`table`]   : first sheet as a styled, self-contained HTML table;
//!    reads through [`sheet::SpreadsheetReader`] in `spawn_blocking`
//! 4. [`capture`] : screenshot of exactly the table element, via
//!    [`chromium::ChromiumEngine`] by default
//! 5. [`artifact`]: unique output naming and post-capture file check

pub mod artifact;
pub mod capture;
pub mod chromium;
pub mod input;
pub mod range;
pub mod sheet;
pub mod table;
