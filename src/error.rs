//! Unified error types for sessionlog.
//!
//! This module provides a single [`ExportError`] enum that covers all error
//! cases in the library.
//!
//! # Error Handling Philosophy
//!
//! - Filtering, clash detection and grouping never fail: missing message
//!   fields only suppress the matching rendered element
//! - Image fetch failures are recovered per URL and never reach this type
//! - Document assembly failures are terminal for one export attempt
//! - Clipboard extraction failures are reported separately, so callers can
//!   fall back to a file download

use std::io;

use thiserror::Error;

/// A specialized [`Result`] type for sessionlog operations.
///
/// # Example
///
/// ```rust
/// use sessionlog::error::Result;
/// use sessionlog::Message;
///
/// fn my_function() -> Result<Vec<Message>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExportError>;

/// The error type for all sessionlog operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// An I/O error occurred while reading a session log or writing output.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A session log or settings file is not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid date in filter configuration.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// Invalid time of day in filter configuration.
    #[error("Invalid time '{input}'. Expected format: {expected}")]
    InvalidTime {
        /// The invalid time string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// The date range is inverted.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange {
        /// Lower bound as provided
        from: String,
        /// Upper bound as provided
        to: String,
    },

    /// Rendering the document failed.
    ///
    /// Reported once per export attempt; earlier exports are unaffected.
    #[error("Failed to render document: {message}")]
    Render {
        /// Description of the failure
        message: String,
    },

    /// The style block or body boundaries could not be located in the
    /// assembled document.
    #[error("Could not extract clipboard fragment: missing {marker}")]
    ClipboardExtract {
        /// The structural marker that was not found
        marker: &'static str,
    },

    /// The HTTP client used for image embedding could not be built.
    #[cfg(feature = "http")]
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<std::fmt::Error> for ExportError {
    fn from(_: std::fmt::Error) -> Self {
        ExportError::render("formatter error while writing rows")
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ExportError {
    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        ExportError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates an invalid time error.
    pub fn invalid_time(input: impl Into<String>) -> Self {
        ExportError::InvalidTime {
            input: input.into(),
            expected: "HH:MM",
        }
    }

    /// Creates an inverted date range error.
    pub fn invalid_date_range(from: impl ToString, to: impl ToString) -> Self {
        ExportError::InvalidDateRange {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates a render error.
    pub fn render(message: impl Into<String>) -> Self {
        ExportError::Render {
            message: message.into(),
        }
    }

    /// Creates a clipboard extraction error.
    pub fn clipboard_extract(marker: &'static str) -> Self {
        ExportError::ClipboardExtract { marker }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ExportError::Io(_))
    }

    /// Returns `true` if this is a date, time or range error.
    pub fn is_invalid_filter(&self) -> bool {
        matches!(
            self,
            ExportError::InvalidDate { .. }
                | ExportError::InvalidTime { .. }
                | ExportError::InvalidDateRange { .. }
        )
    }

    /// Returns `true` if this is a render error.
    pub fn is_render(&self) -> bool {
        matches!(self, ExportError::Render { .. })
    }

    /// Returns `true` if this is a clipboard extraction error.
    pub fn is_clipboard_extract(&self) -> bool {
        matches!(self, ExportError::ClipboardExtract { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
