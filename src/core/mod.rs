//! Core processing logic for sessionlog.
//!
//! This module contains the synchronous stages of the pipeline, in order:
//! - [`filter`] - Message filtering by exclusion, channel, date/time and text
//! - [`patterns`] - Marker, channel and sender predicate tables
//! - [`clash`] - Clash-block detection over the filtered sequence
//! - [`grouping`] - Row structure (dates, channels, clusters, system buffers)
//! - [`output`] - HTML rendering and document assembly
//!
//! # Quick Start
//!
//! ```rust
//! # fn main() -> sessionlog::Result<()> {
//! use sessionlog::Message;
//! use sessionlog::config::RenderSettings;
//! use sessionlog::core::{FilterConfig, RenderMode, apply_filters, render_document};
//!
//! let messages = vec![
//!     Message::new(0, "Alice", "Hello!"),
//!     Message::new(1, "Bob", "Hi there!"),
//! ];
//! let filter = FilterConfig::new().with_search("hello");
//! let filtered = apply_filters(&messages, &filter);
//!
//! let html = render_document(&filtered, &RenderSettings::new(), RenderMode::Document)?;
//! assert!(html.contains("Hello!"));
//! assert!(!html.contains("Hi there!"));
//! # Ok(())
//! # }
//! ```

pub mod clash;
pub mod filter;
pub mod grouping;
pub mod output;
pub mod patterns;

// Re-export main types for convenience
pub use clash::{ClashAnnotations, ClashBlock, Combatant, WinnerSide, detect_clashes};
pub use filter::{FilterConfig, apply_filters};
pub use grouping::{GroupingSettings, Row, group_rows};
pub use output::{
    ClipboardFragment, RenderMode, assemble, extract_clipboard_fragment, render_document,
    suggest_filename,
};

// Re-export Message from the crate root
pub use crate::Message;
