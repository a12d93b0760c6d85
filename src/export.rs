//! Export orchestration.
//!
//! Runs one pipeline pass for an [`ExportRequest`]: filter, optionally embed
//! images, assemble the document, and shape the caller-visible
//! [`ExportOutcome`]. Previews use the same stages without embedding.
//!
//! # Example
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> sessionlog::Result<()> {
//! use sessionlog::Message;
//! use sessionlog::export::{ExportOutcome, ExportRequest, Exporter};
//!
//! let messages = vec![Message::new(0, "Alice", "Hello!")];
//! let outcome = Exporter::new().export(&messages, &ExportRequest::default()).await?;
//!
//! if let ExportOutcome::Document { chunks, filename } = outcome {
//!     assert!(filename.ends_with(".html"));
//!     assert!(chunks.concat().contains("Hello!"));
//! }
//! # Ok(())
//! # }
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::Message;
use crate::config::{ExportOptions, RenderSettings};
use crate::core::filter::{FilterConfig, apply_filters};
use crate::core::output::{
    ClipboardFragment, RenderMode, assemble, extract_clipboard_fragment, suggest_filename,
};
use crate::embed::{EmbedOptions, ImageFetcher, embed_images, rewrite_messages};
use crate::error::Result;
use crate::format::ExportFormat;
use crate::progress::{ProgressCallback, ProgressEvent, no_progress};

/// Immutable snapshot of everything one export needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    pub filter: FilterConfig,
    pub render: RenderSettings,
    pub options: ExportOptions,
}

impl ExportRequest {
    pub fn new(filter: FilterConfig, render: RenderSettings, options: ExportOptions) -> Self {
        Self {
            filter,
            render,
            options,
        }
    }
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// A complete document, as chunks, with a suggested file name.
    Document { chunks: Vec<String>, filename: String },
    /// The pasteable fragment of the document.
    Clipboard(ClipboardFragment),
    /// The filters left nothing to export.
    Empty,
}

/// Shared flag a host sets to stop image embedding before the next batch.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs exports with an optional image fetcher, a progress sink and a
/// cancellation flag.
pub struct Exporter<'f> {
    fetcher: Option<&'f dyn ImageFetcher>,
    progress: ProgressCallback,
    cancel: CancelHandle,
}

impl Default for Exporter<'_> {
    fn default() -> Self {
        Self {
            fetcher: None,
            progress: no_progress(),
            cancel: CancelHandle::default(),
        }
    }
}

impl<'f> Exporter<'f> {
    /// Creates an exporter without fetcher and with a no-op progress sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fetcher used when embedding is requested.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: &'f dyn ImageFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the cancellation flag consulted between embedding batches.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    fn status(&self, message: impl Into<String>) {
        (self.progress)(ProgressEvent::status(message));
    }

    /// Runs one export.
    ///
    /// Images are embedded only when the request asks for it and the format
    /// is a full document. Without a fetcher the references are kept and a
    /// status event says so.
    ///
    /// # Errors
    ///
    /// Returns an invalid-range error for an inverted date filter,
    /// [`ExportError::Render`](crate::ExportError::Render) if assembly fails,
    /// or [`ExportError::ClipboardExtract`](crate::ExportError::ClipboardExtract)
    /// if the fragment cannot be located.
    pub async fn export(
        &self,
        messages: &[Message],
        request: &ExportRequest,
    ) -> Result<ExportOutcome> {
        request.filter.validate()?;
        let filtered = apply_filters(messages, &request.filter);
        if filtered.is_empty() {
            self.status("No messages match the current filters");
            return Ok(ExportOutcome::Empty);
        }

        let embedded = match self.fetcher {
            Some(fetcher) if request.options.should_embed() => {
                self.status("Embedding images...");
                let options = EmbedOptions::from(&request.options);
                let images = embed_images(&filtered, fetcher, &options, |progress| {
                    (self.progress)(ProgressEvent::Images(progress));
                    if self.cancel.is_cancelled() {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                })
                .await;
                Some(rewrite_messages(&filtered, &images))
            }
            None if request.options.should_embed() => {
                warn!("image embedding requested but no fetcher is configured");
                self.status("Images not embedded: no fetcher configured");
                None
            }
            _ => None,
        };
        let render_refs: Vec<&Message> = match &embedded {
            Some(copies) => copies.iter().collect(),
            None => filtered.clone(),
        };

        self.status(format!("Rendering {} messages...", render_refs.len()));
        let chunks = assemble(&render_refs, &request.render, RenderMode::Document)?;

        let outcome = match request.options.format {
            ExportFormat::Document => {
                let now = Utc::now().with_timezone(&request.render.display_offset());
                ExportOutcome::Document {
                    chunks,
                    filename: suggest_filename(&request.render.title, now),
                }
            }
            ExportFormat::ClipboardFragment => {
                ExportOutcome::Clipboard(extract_clipboard_fragment(&chunks)?)
            }
        };

        info!(
            messages = filtered.len(),
            format = %request.options.format,
            embedded = embedded.is_some(),
            "export finished"
        );
        self.status("Export complete");
        Ok(outcome)
    }
}

/// Renders a live preview for the current filter snapshot.
///
/// Returns `None` when the filters leave nothing to show. Preview rows carry
/// their original index so clicks can be mapped back to exclusions.
///
/// # Errors
///
/// Returns an invalid-range error for an inverted date filter, or a render
/// error if assembly fails.
pub fn preview(
    messages: &[Message],
    filter: &FilterConfig,
    render: &RenderSettings,
) -> Result<Option<Vec<String>>> {
    filter.validate()?;
    let filtered = apply_filters(messages, filter);
    if filtered.is_empty() {
        debug!("preview has no messages");
        return Ok(None);
    }
    assemble(&filtered, render, RenderMode::Preview).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::FetchError;
    use crate::preview::PreviewEvent;
    use crate::progress::Progress;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct EchoFetcher;

    #[async_trait]
    impl ImageFetcher for EchoFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
            Ok(format!("data:image/png;base64,{}", url.len()))
        }
    }

    fn sample() -> Vec<Message> {
        vec![
            Message::new(0, "Alice", "Hello").with_icon("https://img/alice.png"),
            Message::new(1, "Bob", "Hi").with_icon("https://img/bob.png"),
            Message::new(2, "Alice", "secret").with_channel("gm", "GM"),
        ]
    }

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<ProgressEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback = Arc::new(move |event| sink.lock().unwrap().push(event));
        (callback, events)
    }

    #[tokio::test]
    async fn test_document_export() {
        let request = ExportRequest::new(
            FilterConfig::new().with_channel_enabled("gm", false),
            RenderSettings::new().with_title("Night"),
            ExportOptions::new(),
        );
        let outcome = Exporter::new().export(&sample(), &request).await.unwrap();

        let ExportOutcome::Document { chunks, filename } = outcome else {
            panic!("expected a document");
        };
        let html = chunks.concat();
        assert!(html.contains("Hello"));
        assert!(!html.contains("secret"));
        assert!(filename.starts_with("Night_"));
        assert!(filename.ends_with(".html"));
    }

    #[tokio::test]
    async fn test_empty_outcome() {
        let request = ExportRequest {
            filter: FilterConfig::new().with_search("nothing matches this"),
            ..ExportRequest::default()
        };
        let outcome = Exporter::new().export(&sample(), &request).await.unwrap();
        assert_eq!(outcome, ExportOutcome::Empty);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let request = ExportRequest {
            filter: FilterConfig::new()
                .with_date_from("2024-06-02")
                .unwrap()
                .with_date_to("2024-06-01")
                .unwrap(),
            ..ExportRequest::default()
        };
        let err = Exporter::new().export(&sample(), &request).await.unwrap_err();
        assert!(err.is_invalid_filter());
    }

    #[tokio::test]
    async fn test_embedding_rewrites_copies_and_reports_progress() {
        let messages = sample();
        let (callback, events) = recorder();
        let request = ExportRequest {
            options: ExportOptions::new().with_embed_images(true),
            ..ExportRequest::default()
        };
        let fetcher = EchoFetcher;
        let outcome = Exporter::new()
            .with_fetcher(&fetcher)
            .with_progress(callback)
            .export(&messages, &request)
            .await
            .unwrap();

        let ExportOutcome::Document { chunks, .. } = outcome else {
            panic!("expected a document");
        };
        assert!(chunks.concat().contains("src=\"data:image/png;base64,"));
        assert_eq!(messages[0].icon_ref.as_deref(), Some("https://img/alice.png"));

        let events = events.lock().unwrap();
        assert!(events.contains(&ProgressEvent::Images(Progress::new(2, 2))));
        assert_eq!(events.last(), Some(&ProgressEvent::status("Export complete")));
    }

    #[tokio::test]
    async fn test_embed_without_fetcher_reports_status() {
        let (callback, events) = recorder();
        let request = ExportRequest {
            options: ExportOptions::new().with_embed_images(true),
            ..ExportRequest::default()
        };
        let outcome = Exporter::new()
            .with_progress(callback)
            .export(&sample(), &request)
            .await
            .unwrap();

        let ExportOutcome::Document { chunks, .. } = outcome else {
            panic!("expected a document");
        };
        let html = chunks.concat();
        assert!(html.contains("src=\"https://img/alice.png\""));
        assert!(!html.contains("src=\"data:"));

        let events = events.lock().unwrap();
        assert!(events.contains(&ProgressEvent::status(
            "Images not embedded: no fetcher configured"
        )));
        assert_eq!(events.last(), Some(&ProgressEvent::status("Export complete")));
    }

    #[tokio::test]
    async fn test_clipboard_never_embeds() {
        let (callback, events) = recorder();
        let request = ExportRequest {
            options: ExportOptions::new()
                .with_embed_images(true)
                .with_format(ExportFormat::ClipboardFragment),
            ..ExportRequest::default()
        };
        let fetcher = EchoFetcher;
        let outcome = Exporter::new()
            .with_fetcher(&fetcher)
            .with_progress(callback)
            .export(&sample(), &request)
            .await
            .unwrap();

        let ExportOutcome::Clipboard(fragment) = outcome else {
            panic!("expected a clipboard fragment");
        };
        assert!(fragment.body.contains("https://img/alice.png"));
        assert!(
            !events
                .lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, ProgressEvent::Images(_)))
        );
    }

    #[tokio::test]
    async fn test_cancel_keeps_references() {
        let messages: Vec<Message> = (0..10)
            .map(|i| Message::new(i, "A", "x").with_image(format!("https://img/{i}.png")))
            .collect();
        let cancel = CancelHandle::new();
        cancel.cancel();
        let request = ExportRequest {
            options: ExportOptions::new().with_embed_images(true),
            ..ExportRequest::default()
        };
        let fetcher = EchoFetcher;
        let outcome = Exporter::new()
            .with_fetcher(&fetcher)
            .with_cancel(cancel)
            .export(&messages, &request)
            .await
            .unwrap();

        let ExportOutcome::Document { chunks, .. } = outcome else {
            panic!("expected a document");
        };
        let html = chunks.concat();
        assert_eq!(html.matches("src=\"data:").count(), 6);
        assert!(html.contains("src=\"https://img/9.png\""));
    }

    #[test]
    fn test_preview_round_trip() {
        let messages = sample();
        let filter = FilterConfig::new();
        let render = RenderSettings::new();

        let first = preview(&messages, &filter, &render).unwrap().unwrap();
        assert!(first.concat().contains("data-index=\"1\""));

        let event = PreviewEvent::parse(r#"{"type":"toggleExclude","index":1}"#).unwrap();
        let excluded = event.apply(&filter);
        let second = preview(&messages, &excluded, &render).unwrap().unwrap();
        assert!(!second.concat().contains("data-index=\"1\""));

        let restored = event.apply(&excluded);
        assert_eq!(restored, filter);
        assert_eq!(preview(&messages, &restored, &render).unwrap().unwrap(), first);
    }

    #[test]
    fn test_preview_empty() {
        let filter = FilterConfig::new().with_search("zzz");
        assert!(preview(&sample(), &filter, &RenderSettings::new()).unwrap().is_none());
    }
}
