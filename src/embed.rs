//! Image embedding.
//!
//! Replaces external image references (avatars and attachments) with
//! `data:<mime>;base64,<payload>` URLs so the exported document is
//! self-contained. Fetches run in sequential batches; the members of one
//! batch run concurrently, each bounded by a timeout. A failed, rejected or
//! timed-out fetch keeps the original reference.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "http")]
//! # async fn example() -> sessionlog::Result<()> {
//! use std::ops::ControlFlow;
//! use sessionlog::Message;
//! use sessionlog::embed::{EmbedOptions, HttpFetcher, embed_images, rewrite_messages};
//!
//! let messages = vec![Message::new(0, "Alice", "hi").with_icon("https://example.com/a.png")];
//! let refs: Vec<&Message> = messages.iter().collect();
//!
//! let fetcher = HttpFetcher::new()?;
//! let images = embed_images(&refs, &fetcher, &EmbedOptions::default(), |progress| {
//!     println!("{}/{}", progress.done, progress.total);
//!     ControlFlow::Continue(())
//! })
//! .await;
//! let embedded = rewrite_messages(&refs, &images);
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::Message;
use crate::config::{DEFAULT_IMAGE_BATCH_SIZE, DEFAULT_IMAGE_TIMEOUT_SECS, ExportOptions};
use crate::progress::Progress;

/// Why a single image could not be fetched.
///
/// Never surfaces from [`embed_images`]: the reference is kept and the
/// failure is logged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The request could not be completed.
    #[error("request failed: {0}")]
    Request(String),
}

/// Fetches one image and returns it as a data URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches `url` and returns `data:<mime>;base64,<payload>`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Batching and timeout settings for [`embed_images`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Fetches run concurrently within one batch.
    pub batch_size: usize,
    /// Upper bound for a single fetch.
    pub timeout: Duration,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_IMAGE_BATCH_SIZE,
            timeout: Duration::from_secs(DEFAULT_IMAGE_TIMEOUT_SECS),
        }
    }
}

impl EmbedOptions {
    /// Sets the batch size (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sets the per-fetch timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&ExportOptions> for EmbedOptions {
    fn from(options: &ExportOptions) -> Self {
        Self::default()
            .with_batch_size(options.image_batch_size)
            .with_timeout(Duration::from_secs(options.image_timeout_secs))
    }
}

/// Mapping from every collected reference to its replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedImages {
    map: HashMap<String, String>,
    cancelled: bool,
}

impl EmbeddedImages {
    /// Returns the replacement for `reference`, or the reference itself when
    /// it was not collected or could not be embedded.
    pub fn resolve<'a>(&'a self, reference: &'a str) -> &'a str {
        self.map.get(reference).map_or(reference, String::as_str)
    }

    /// Returns the mapped value of a collected reference.
    pub fn get(&self, reference: &str) -> Option<&str> {
        self.map.get(reference).map(String::as_str)
    }

    /// Number of collected references.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no reference was collected.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of references actually replaced by a data URL.
    pub fn embedded_count(&self) -> usize {
        self.map.iter().filter(|(from, to)| from != to).count()
    }

    /// Returns `true` if the caller declined a batch.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

fn is_embeddable(reference: &str) -> bool {
    let reference = reference.trim();
    !reference.is_empty() && !reference.starts_with("data:")
}

/// Collects the distinct avatar and attachment references of `messages`, in
/// first-seen order. Empty references and data URLs are skipped.
///
/// ```rust
/// use sessionlog::Message;
/// use sessionlog::embed::collect_image_refs;
///
/// let messages = vec![
///     Message::new(0, "A", "").with_icon("a.png").with_image("b.png"),
///     Message::new(1, "B", "").with_icon("a.png").with_image("data:image/png;base64,AA=="),
/// ];
/// let refs: Vec<&Message> = messages.iter().collect();
/// assert_eq!(collect_image_refs(&refs), vec!["a.png", "b.png"]);
/// ```
pub fn collect_image_refs(messages: &[&Message]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for msg in messages {
        for reference in [msg.icon_ref.as_deref(), msg.image_ref.as_deref()]
            .into_iter()
            .flatten()
        {
            if is_embeddable(reference) && seen.insert(reference) {
                refs.push(reference.to_string());
            }
        }
    }
    refs
}

async fn fetch_one(fetcher: &dyn ImageFetcher, url: &str, timeout: Duration) -> Option<String> {
    match tokio::time::timeout(timeout, fetcher.fetch(url)).await {
        Ok(Ok(data_url)) => Some(data_url),
        Ok(Err(error)) => {
            warn!(url, %error, "image fetch failed, keeping reference");
            None
        }
        Err(_) => {
            warn!(
                url,
                timeout_secs = timeout.as_secs_f64(),
                "image fetch timed out, keeping reference"
            );
            None
        }
    }
}

/// Fetches every image referenced by `messages` and maps it to a data URL.
///
/// References are processed in batches of `options.batch_size`. After each
/// batch `on_progress` receives the running count; returning
/// [`ControlFlow::Break`] stops before the next batch, and the references not
/// yet fetched map to themselves.
pub async fn embed_images<F>(
    messages: &[&Message],
    fetcher: &dyn ImageFetcher,
    options: &EmbedOptions,
    mut on_progress: F,
) -> EmbeddedImages
where
    F: FnMut(Progress) -> ControlFlow<()>,
{
    let refs = collect_image_refs(messages);
    let total = refs.len();
    let mut images = EmbeddedImages {
        map: HashMap::with_capacity(total),
        cancelled: false,
    };

    let mut done = 0;
    let mut batches = refs.chunks(options.batch_size.max(1));
    for batch in batches.by_ref() {
        let results =
            join_all(batch.iter().map(|url| fetch_one(fetcher, url, options.timeout))).await;
        for (url, result) in batch.iter().zip(results) {
            let replacement = result.unwrap_or_else(|| url.clone());
            images.map.insert(url.clone(), replacement);
        }
        done += batch.len();

        if on_progress(Progress::new(done, total)).is_break() && done < total {
            images.cancelled = true;
            break;
        }
    }

    for url in batches.flatten() {
        images.map.insert(url.clone(), url.clone());
    }

    debug!(
        total,
        embedded = images.embedded_count(),
        cancelled = images.cancelled,
        "embedded images"
    );
    images
}

/// Returns copies of `messages` with avatar and attachment references
/// replaced. The originals are not modified.
pub fn rewrite_messages(messages: &[&Message], images: &EmbeddedImages) -> Vec<Message> {
    messages
        .iter()
        .map(|msg| {
            let mut copy = (*msg).clone();
            copy.icon_ref = msg.icon_ref.as_deref().map(|r| images.resolve(r).to_string());
            copy.image_ref = msg.image_ref.as_deref().map(|r| images.resolve(r).to_string());
            copy
        })
        .collect()
}

/// Builds a data URL from a MIME type and raw bytes.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, B64.encode(bytes))
}

/// Guesses an image MIME type from its leading bytes.
///
/// ```rust
/// use sessionlog::embed::sniff_mime;
///
/// assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n...."), Some("image/png"));
/// assert_eq!(sniff_mime(b"GIF89a"), Some("image/gif"));
/// assert_eq!(sniff_mime(b"hello"), None);
/// ```
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
        (b"\x00\x00\x01\x00", "image/x-icon"),
    ];
    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| bytes.starts_with(magic)) {
        return Some(*mime);
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some("image/svg+xml");
    }
    None
}

/// Picks the MIME type from a `Content-Type` header, falling back to
/// sniffing the payload.
pub fn resolve_mime(content_type: Option<&str>, bytes: &[u8]) -> String {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_lowercase())
        .filter(|ct| ct.starts_with("image/"));
    declared
        .or_else(|| sniff_mime(bytes).map(str::to_string))
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// [`ImageFetcher`] backed by a shared `reqwest` client.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// Builds a fetcher with a default client.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Http`](crate::ExportError::Http) if the client
    /// cannot be constructed.
    pub fn new() -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("sessionlog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let mime = resolve_mime(content_type.as_deref(), &bytes);
        Ok(data_url(&mime, &bytes))
    }
}
