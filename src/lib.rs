//! # Sessionlog
//!
//! A Rust library for turning tabletop session chat logs into standalone,
//! styled HTML documents.
//!
//! ## Overview
//!
//! A session log is an ordered list of chat [`Message`]s: character speech,
//! dice rolls, whispers, system notices and image posts spread over several
//! channels. Sessionlog provides:
//! - **Filtering**: date and time windows, text search, channel toggles and
//!   per-message exclusions
//! - **Clash detection**: contested-roll blocks with rounds and a winner
//! - **Grouping**: date separators, channel headers, speaker clusters
//! - **Rendering**: a self-contained HTML document or a clipboard fragment
//! - **Image embedding**: remote images inlined as data URLs, in batches
//! - **Preview**: click-to-exclude live preview with debounced regeneration
//!
//! ## Quick Start
//!
//! ```rust
//! use sessionlog::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let messages = vec![
//!         Message::new(0, "Alice", "We enter the crypt."),
//!         Message::system(1, "Bob joined the table"),
//!     ];
//!
//!     let filter = FilterConfig::new().with_search("crypt");
//!     let filtered = apply_filters(&messages, &filter);
//!
//!     let settings = RenderSettings::new().with_title("Night 1");
//!     let html = render_document(&filtered, &settings, RenderMode::Document)?;
//!     assert!(html.contains("We enter the crypt."));
//!     Ok(())
//! }
//! ```
//!
//! ## Exporting with Images
//!
//! The [`export::Exporter`] runs the whole pipeline and can inline images
//! through any [`embed::ImageFetcher`]:
//!
//! ```rust,no_run
//! # #[cfg(feature = "http")]
//! # #[tokio::main]
//! # async fn main() -> sessionlog::Result<()> {
//! use sessionlog::prelude::*;
//! use sessionlog::embed::HttpFetcher;
//!
//! let log = load_session("session.json")?;
//! let fetcher = HttpFetcher::new()?;
//! let request = ExportRequest::default();
//! let request = ExportRequest {
//!     options: request.options.with_embed_images(true),
//!     ..request
//! };
//!
//! let outcome = Exporter::new()
//!     .with_fetcher(&fetcher)
//!     .with_progress(stderr_progress())
//!     .export(&log.messages, &request)
//!     .await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "http"))]
//! # fn main() {}
//! ```
//!
//! ## Module Structure
//!
//! - [`message`]: [`Message`] and [`MessageKind`](message::MessageKind)
//! - [`core`]: the pipeline stages
//!   - [`core::filter`]: [`FilterConfig`](core::FilterConfig), [`apply_filters`](core::apply_filters)
//!   - [`core::clash`]: [`detect_clashes`](core::detect_clashes)
//!   - [`core::grouping`]: [`group_rows`](core::group_rows)
//!   - [`core::output`]: HTML rendering and document assembly
//! - [`config`]: [`RenderSettings`](config::RenderSettings), [`ExportOptions`](config::ExportOptions)
//! - [`embed`]: image embedding
//! - [`export`]: export orchestration
//! - [`preview`]: preview events and debouncing
//! - [`session`]: loading session logs and settings files
//! - [`format`]: [`ExportFormat`](format::ExportFormat)
//! - [`progress`]: progress callbacks
//! - [`error`]: [`ExportError`], [`Result`]
//! - [`prelude`]: convenient re-exports

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod embed;
pub mod error;
pub mod export;
pub mod format;
pub mod message;
pub mod preview;
pub mod progress;
pub mod session;

pub use error::{ExportError, Result};
pub use message::Message;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use sessionlog::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Message;
    pub use crate::message::MessageKind;

    pub use crate::error::{ExportError, Result};

    // Pipeline stages
    pub use crate::core::clash::{ClashAnnotations, ClashBlock, WinnerSide, detect_clashes};
    pub use crate::core::filter::{FilterConfig, apply_filters};
    pub use crate::core::grouping::{GroupingSettings, Row, group_rows};
    pub use crate::core::output::{
        ClipboardFragment, RenderMode, assemble, extract_clipboard_fragment, render_document,
        suggest_filename,
    };

    // Settings
    pub use crate::config::{DividerWeight, ExportOptions, Palette, RenderSettings};
    pub use crate::format::ExportFormat;

    // Export and preview
    pub use crate::embed::{EmbedOptions, ImageFetcher, embed_images};
    pub use crate::export::{CancelHandle, ExportOutcome, ExportRequest, Exporter, preview};
    pub use crate::preview::{PreviewDebouncer, PreviewEvent};
    pub use crate::progress::{
        Progress, ProgressCallback, ProgressEvent, no_progress, stderr_progress,
    };
    pub use crate::session::{SessionLog, SettingsFile, load_session, parse_session};
}
