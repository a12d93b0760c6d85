//! Export target formats.
//!
//! These types carry no CLI framework dependency; the CLI maps its own
//! `ValueEnum` onto [`ExportFormat`].
//!
//! # Example
//!
//! ```rust
//! use sessionlog::format::ExportFormat;
//! use std::str::FromStr;
//!
//! let format = ExportFormat::from_str("clipboard").unwrap();
//! assert_eq!(format, ExportFormat::ClipboardFragment);
//! assert!(!format.embeds_images());
//! ```

use serde::{Deserialize, Serialize};

/// What an export produces.
///
/// - [`Document`](ExportFormat::Document) - a complete standalone HTML file
/// - [`ClipboardFragment`](ExportFormat::ClipboardFragment) - the style block
///   and body interior only, for pasting into another page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ExportFormat {
    /// Standalone HTML document (default).
    #[default]
    Document,

    /// Style block plus body interior.
    #[serde(alias = "clipboard")]
    ClipboardFragment,
}

impl ExportFormat {
    /// Returns the file extension for this format (without dot).
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Document | ExportFormat::ClipboardFragment => "html",
        }
    }

    /// Returns the MIME type of the produced text.
    pub fn mime_type(&self) -> &'static str {
        "text/html"
    }

    /// Returns `false` for formats that never inline image payloads.
    ///
    /// ```rust
    /// use sessionlog::format::ExportFormat;
    ///
    /// assert!(ExportFormat::Document.embeds_images());
    /// assert!(!ExportFormat::ClipboardFragment.embeds_images());
    /// ```
    pub fn embeds_images(&self) -> bool {
        matches!(self, ExportFormat::Document)
    }

    /// Returns all accepted format names.
    pub fn all_names() -> &'static [&'static str] {
        &["document", "html", "clipboard", "clipboard_fragment", "fragment"]
    }

    /// Returns all available formats.
    pub fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Document, ExportFormat::ClipboardFragment]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Document => write!(f, "HTML document"),
            ExportFormat::ClipboardFragment => write!(f, "clipboard fragment"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" | "html" => Ok(ExportFormat::Document),
            "clipboard" | "clipboard_fragment" | "fragment" => Ok(ExportFormat::ClipboardFragment),
            _ => Err(format!(
                "Unknown format: '{}'. Expected one of: {}",
                s,
                ExportFormat::all_names().join(", ")
            )),
        }
    }
}
