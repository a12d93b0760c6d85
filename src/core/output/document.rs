//! Document assembly.
//!
//! A document is a head chunk, zero or more row chunks of
//! [`ROWS_PER_CHUNK`] rows each, and a tail chunk. [`assemble`] returns the
//! chunks so a host can stream them into a sink; [`render_document`]
//! produces the same bytes in one string.
//!
//! # Example
//!
//! ```rust
//! # fn main() -> sessionlog::Result<()> {
//! use sessionlog::Message;
//! use sessionlog::config::RenderSettings;
//! use sessionlog::core::output::{RenderMode, assemble, render_document};
//!
//! let messages = vec![Message::new(0, "Alice", "Hello!")];
//! let refs: Vec<&Message> = messages.iter().collect();
//! let settings = RenderSettings::new().with_title("Demo");
//!
//! let chunks = assemble(&refs, &settings, RenderMode::Document)?;
//! assert_eq!(chunks.concat(), render_document(&refs, &settings, RenderMode::Document)?);
//! # Ok(())
//! # }
//! ```

use std::fmt::Write;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::Message;
use crate::config::RenderSettings;
use crate::core::clash::detect_clashes;
use crate::core::grouping::{GroupingSettings, Row, group_rows};
use crate::core::output::html::{RenderContext, RenderMode, html_escape, render_row};
use crate::core::output::style::stylesheet;
use crate::error::{ExportError, Result};

/// Number of rows per body chunk.
pub const ROWS_PER_CHUNK: usize = 500;

const PREVIEW_SCRIPT: &str = r#"<script>
document.addEventListener("click", function (event) {
  if (event.target.closest("summary")) return;
  var row = event.target.closest("[data-index]");
  if (!row) return;
  window.parent.postMessage({ type: "toggleExclude", index: Number(row.dataset.index) }, "*");
});
</script>
"#;

/// The pasteable part of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipboardFragment {
    /// Content of the `<style>` element.
    pub style: String,
    /// Everything between `<body>` and `</body>`.
    pub body: String,
}

impl ClipboardFragment {
    /// Returns the fragment as one pasteable HTML string.
    pub fn to_html(&self) -> String {
        format!("<style>{}</style>\n{}", self.style, self.body)
    }
}

fn write_head(out: &mut String, settings: &RenderSettings) -> std::fmt::Result {
    let title = html_escape(&settings.title);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    writeln!(out, "<title>{title}</title>")?;
    if let Some(url) = settings.font_stylesheet_url.as_deref().filter(|u| !u.is_empty()) {
        writeln!(out, "<link rel=\"stylesheet\" href=\"{}\">", html_escape(url))?;
    }
    writeln!(out, "<style>{}</style>", stylesheet(settings))?;
    out.push_str("</head>\n<body>\n<div class=\"page\">\n<header class=\"page-header\">");
    if let Some(image) = settings.header_image_ref.as_deref().filter(|r| !r.is_empty()) {
        write!(
            out,
            "<img class=\"header-image\" src=\"{}\" alt=\"\">",
            html_escape(image)
        )?;
    }
    writeln!(out, "<h1>{title}</h1></header>\n<main class=\"log\">")?;
    Ok(())
}

fn write_tail(out: &mut String, message_count: usize, mode: RenderMode) -> std::fmt::Result {
    let noun = if message_count == 1 { "message" } else { "messages" };
    writeln!(
        out,
        "</main>\n<footer class=\"page-footer\">{message_count} {noun}</footer>\n</div>"
    )?;
    if mode == RenderMode::Preview {
        out.push_str(PREVIEW_SCRIPT);
    }
    out.push_str("</body>\n</html>\n");
    Ok(())
}

fn render_rows(rows: &[Row<'_>], ctx: &RenderContext) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        render_row(&mut out, row, ctx)?;
    }
    Ok(out)
}

/// Detects clashes and groups `messages`, then hands the rows to `f`.
fn with_rows<T>(
    messages: &[&Message],
    settings: &RenderSettings,
    f: impl FnOnce(&[Row<'_>]) -> Result<T>,
) -> Result<T> {
    let clashes = detect_clashes(messages);
    let grouping = GroupingSettings::new(settings.display_offset());
    let rows = group_rows(messages, &clashes, &grouping);
    f(&rows)
}

/// Renders the filtered messages into document chunks.
///
/// The first chunk is the head, the last one the tail; every chunk in
/// between holds at most [`ROWS_PER_CHUNK`] rows.
///
/// # Errors
///
/// Returns [`ExportError::Render`] if writing the markup fails.
pub fn assemble(
    messages: &[&Message],
    settings: &RenderSettings,
    mode: RenderMode,
) -> Result<Vec<String>> {
    let ctx = RenderContext::new(settings.display_offset(), mode);

    with_rows(messages, settings, |rows| {
        let mut chunks = Vec::with_capacity(rows.len() / ROWS_PER_CHUNK + 3);

        let mut head = String::new();
        write_head(&mut head, settings)?;
        chunks.push(head);

        for slice in rows.chunks(ROWS_PER_CHUNK) {
            chunks.push(render_rows(slice, &ctx)?);
        }

        let mut tail = String::new();
        write_tail(&mut tail, messages.len(), mode)?;
        chunks.push(tail);

        tracing::debug!(rows = rows.len(), chunks = chunks.len(), "assembled document");
        Ok(chunks)
    })
}

/// Renders the filtered messages into one string.
///
/// The output is byte-identical to concatenating the chunks of
/// [`assemble`] for the same input.
///
/// # Errors
///
/// Returns [`ExportError::Render`] if writing the markup fails.
pub fn render_document(
    messages: &[&Message],
    settings: &RenderSettings,
    mode: RenderMode,
) -> Result<String> {
    let ctx = RenderContext::new(settings.display_offset(), mode);

    with_rows(messages, settings, |rows| {
        let mut out = String::new();
        write_head(&mut out, settings)?;
        out.push_str(&render_rows(rows, &ctx)?);
        write_tail(&mut out, messages.len(), mode)?;
        Ok(out)
    })
}

fn find_from(haystack: &str, needle: &'static str, from: usize) -> Result<usize> {
    haystack
        .get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|offset| from + offset)
        .ok_or_else(|| ExportError::clipboard_extract(needle))
}

/// Extracts the style block and body interior from assembled chunks.
///
/// # Errors
///
/// Returns [`ExportError::ClipboardExtract`] naming the first structural
/// marker that could not be found.
pub fn extract_clipboard_fragment(chunks: &[String]) -> Result<ClipboardFragment> {
    let document = chunks.concat();

    let style_open = find_from(&document, "<style>", 0)?;
    let style_start = style_open + "<style>".len();
    let style_end = find_from(&document, "</style>", style_start)?;

    let body_open = find_from(&document, "<body>", style_end)?;
    let body_start = body_open + "<body>".len();
    let body_end = document
        .rfind("</body>")
        .filter(|end| *end >= body_start)
        .ok_or_else(|| ExportError::clipboard_extract("</body>"))?;

    Ok(ClipboardFragment {
        style: document[style_start..style_end].to_string(),
        body: document[body_start..body_end].trim().to_string(),
    })
}

/// Suggests a filesystem-safe file name: `<title>_<YYYYMMDD>_<HHMM>.html`.
///
/// ```rust
/// use chrono::{FixedOffset, TimeZone};
/// use sessionlog::core::output::suggest_filename;
///
/// let at = FixedOffset::east_opt(9 * 3600).unwrap()
///     .with_ymd_and_hms(2024, 6, 15, 21, 7, 0).unwrap();
/// assert_eq!(suggest_filename("Raid: night/2", at), "Raid_night_2_20240615_2107.html");
/// ```
pub fn suggest_filename(title: &str, at: DateTime<FixedOffset>) -> String {
    let mut safe = String::with_capacity(title.len());
    let mut pending_sep = false;
    for c in title.trim().chars() {
        let invalid = c.is_control()
            || c.is_whitespace()
            || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '_');
        if invalid {
            pending_sep = !safe.is_empty();
            continue;
        }
        if pending_sep {
            safe.push('_');
            pending_sep = false;
        }
        safe.push(c);
    }
    let safe = safe.trim_matches('.');
    let stem = if safe.is_empty() { "session" } else { safe };
    format!("{stem}_{}.html", at.format("%Y%m%d_%H%M"))
}
