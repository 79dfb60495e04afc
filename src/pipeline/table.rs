//! Table rendering: `TabularData` → self-contained HTML document.
//!
//! The document carries its own stylesheet so the browser needs no network
//! access, and wraps the whole table in one element with a fixed `id` that
//! the capture stage crops to.

use crate::config::{CellMarkup, ConversionConfig, DEFAULT_TABLE_ID};
use crate::error::SheetShotError;
use crate::pipeline::sheet::{SpreadsheetReader, TabularData};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

const STYLE: &str = r#"
    body {
        font-family: Arial, sans-serif;
        margin: 20px;
        background-color: white;
    }
    table {
        border-collapse: collapse;
        background-color: white;
    }
    th, td {
        border: 1px solid #ddd;
        padding: 8px;
        text-align: left;
        white-space: nowrap;
    }
    th {
        background-color: #f2f2f2;
        font-weight: bold;
    }
    tbody tr:nth-child(even) {
        background-color: #f9f9f9;
    }
"#;

/// Settings for [`render_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub table_id: String,
    pub cell_markup: CellMarkup,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            table_id: DEFAULT_TABLE_ID.to_string(),
            cell_markup: CellMarkup::default(),
        }
    }
}

impl From<&ConversionConfig> for RenderOptions {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            table_id: config.table_id.clone(),
            cell_markup: config.cell_markup,
        }
    }
}

/// A finished HTML document containing exactly one crop-target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDocument {
    html: String,
    element_id: String,
    rows: usize,
    columns: usize,
}

impl RenderDocument {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    /// `id` of the table element.
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Data rows in the table (header excluded).
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }
}

/// Read the first sheet of `path` and render it.
///
/// Opens by extension first, then by content sniffing. Any reader error,
/// or a sheet with zero columns, is a fatal render failure.
pub fn render(path: &Path, options: &RenderOptions) -> Result<RenderDocument, SheetShotError> {
    let table = SpreadsheetReader::open_with_fallback(path)
        .and_then(|reader| reader.table())
        .map_err(|e| e.into_fatal(path))?;
    Ok(render_table(&table, options))
}

/// Render already-read tabular data. Infallible: a header-only table still
/// yields the element, with an empty body.
pub fn render_table(table: &TabularData, options: &RenderOptions) -> RenderDocument {
    let mut html = String::with_capacity(1024 + table.row_count() * table.column_count() * 32);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    let _ = writeln!(html, "<table id=\"{}\">", escape_html(&options.table_id));

    html.push_str("<thead>\n<tr>");
    for name in &table.header {
        html.push_str("<th>");
        push_cell(&mut html, name, options.cell_markup);
        html.push_str("</th>");
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &table.rows {
        html.push_str("<tr>");
        for value in row {
            html.push_str("<td>");
            push_cell(&mut html, value, options.cell_markup);
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");

    debug!(
        "Rendered table '{}': {} columns × {} data rows, {} bytes",
        options.table_id,
        table.column_count(),
        table.row_count(),
        html.len()
    );

    RenderDocument {
        html,
        element_id: options.table_id.clone(),
        rows: table.row_count(),
        columns: table.column_count(),
    }
}

fn push_cell(html: &mut String, value: &str, markup: CellMarkup) {
    match markup {
        CellMarkup::Escaped => html.push_str(&escape_html(value)),
        CellMarkup::Raw => html.push_str(value),
    }
}

/// Replace the five HTML-significant characters with entities.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
