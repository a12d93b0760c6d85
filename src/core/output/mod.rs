//! HTML output.
//!
//! This module turns a filtered transcript into markup:
//! - [`html`] - escaping, text cleanup and per-row rendering
//! - [`style`] - the stylesheet resolved from [`RenderSettings`](crate::config::RenderSettings)
//! - [`document`] - head/rows/tail assembly, clipboard extraction, file names
//!
//! # Choosing an Entry Point
//!
//! | Function | Use Case |
//! |----------|----------|
//! | [`assemble`] | Streaming into a sink chunk by chunk |
//! | [`render_document`] | One string, e.g. for writing a file |
//! | [`extract_clipboard_fragment`] | Pasting into another page |

pub mod document;
pub mod html;
pub mod style;

pub use document::{
    ClipboardFragment, ROWS_PER_CHUNK, assemble, extract_clipboard_fragment, render_document,
    suggest_filename,
};
pub use html::{RenderMode, clean_text, html_escape};
