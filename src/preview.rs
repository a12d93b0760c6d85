//! Live preview support.
//!
//! The preview document posts a JSON message to its parent window when a row
//! is clicked; [`PreviewEvent`] parses it and turns it into the next filter
//! snapshot. [`PreviewDebouncer`] coalesces bursts of regeneration requests
//! so only the latest one runs once the input has been quiet for a while.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::filter::FilterConfig;
use crate::error::Result;

/// Default quiet window before a preview is regenerated.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// An interaction posted by the preview document.
///
/// ```rust
/// use sessionlog::core::FilterConfig;
/// use sessionlog::preview::PreviewEvent;
///
/// let event = PreviewEvent::parse(r#"{"type":"toggleExclude","index":3}"#).unwrap();
/// let next = event.apply(&FilterConfig::new());
/// assert!(next.excluded_indices.contains(&3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PreviewEvent {
    /// Add the message to the exclusions, or remove it if already excluded.
    ToggleExclude { index: usize },
}

impl PreviewEvent {
    /// Parses the JSON payload posted by the preview script.
    ///
    /// # Errors
    ///
    /// Returns a JSON error for unknown event types or malformed payloads.
    pub fn parse(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Returns the filter snapshot that results from this event.
    pub fn apply(&self, config: &FilterConfig) -> FilterConfig {
        match *self {
            PreviewEvent::ToggleExclude { index } => config.toggled_exclusion(index),
        }
    }
}

enum Command<T> {
    Request(T),
    Cancel,
}

/// Runs a handler for the latest request once no new request has arrived
/// for the quiet window.
///
/// Dropping the debouncer stops its task; a pending request is discarded.
#[derive(Debug)]
pub struct PreviewDebouncer<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> PreviewDebouncer<T> {
    /// Spawns the debouncer task on the current tokio runtime.
    pub fn spawn<F, Fut>(quiet: Duration, handler: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(rx, quiet, handler));
        Self { tx, task }
    }

    /// Schedules `value`, replacing any request still waiting.
    pub fn request(&self, value: T) {
        self.send(Command::Request(value));
    }

    /// Drops the waiting request, if any. A handler already running is not
    /// interrupted.
    pub fn cancel(&self) {
        self.send(Command::Cancel);
    }

    fn send(&self, command: Command<T>) {
        if self.tx.send(command).is_err() {
            tracing::debug!("preview debouncer already stopped");
        }
    }

    /// Returns `true` once the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for PreviewDebouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T, F, Fut>(
    mut rx: mpsc::UnboundedReceiver<Command<T>>,
    quiet: Duration,
    mut handler: F,
) where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut pending: Option<T> = None;
    loop {
        if pending.is_none() {
            match rx.recv().await {
                Some(Command::Request(value)) => pending = Some(value),
                Some(Command::Cancel) => {}
                None => break,
            }
            continue;
        }

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Request(value)) => pending = Some(value),
                Some(Command::Cancel) => pending = None,
                None => break,
            },
            () = tokio::time::sleep(quiet) => {
                if let Some(value) = pending.take() {
                    handler(value).await;
                }
            }
        }
    }
}
