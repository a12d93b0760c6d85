//! Progress reporting for exports.
//!
//! Exports report push-based events through a [`ProgressCallback`]: image
//! embedding progress as `(done, total)` after every batch, and short status
//! strings for the host to display.
//!
//! # Example
//!
//! ```rust
//! use sessionlog::progress::{Progress, ProgressCallback, ProgressEvent};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|event| {
//!     if let ProgressEvent::Images(progress) = event {
//!         println!("Images: {:.0}%", progress.percentage());
//!     }
//! });
//!
//! callback(ProgressEvent::Images(Progress::new(6, 13)));
//! callback(ProgressEvent::status("Rendering..."));
//! ```

use std::sync::Arc;

/// Image embedding progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// References processed so far.
    pub done: usize,
    /// References to process in total.
    pub total: usize,
}

impl Progress {
    /// Creates a new progress value.
    pub fn new(done: usize, total: usize) -> Self {
        Self { done, total }
    }

    /// Returns the progress as a percentage (0.0 - 100.0).
    ///
    /// ```rust
    /// use sessionlog::progress::Progress;
    ///
    /// assert_eq!(Progress::new(3, 12).percentage(), 25.0);
    /// assert_eq!(Progress::new(0, 0).percentage(), 100.0);
    /// ```
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.done as f64 / self.total as f64) * 100.0
        }
    }

    /// Returns whether every reference has been processed.
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }

    /// Returns the number of references still to process.
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.done)
    }
}

/// An event pushed to the host during an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A batch of image fetches finished.
    Images(Progress),
    /// A human-readable status line.
    Status(String),
}

impl ProgressEvent {
    /// Creates a status event.
    pub fn status(message: impl Into<String>) -> Self {
        ProgressEvent::Status(message.into())
    }
}

/// Callback type for receiving progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Creates a no-op progress callback.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Creates a progress callback that prints to stderr.
///
/// ```rust
/// use sessionlog::progress::{Progress, ProgressEvent, stderr_progress};
///
/// let callback = stderr_progress();
/// // Prints "Embedding images: 6/13" to stderr
/// callback(ProgressEvent::Images(Progress::new(6, 13)));
/// ```
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|event| match event {
        ProgressEvent::Images(progress) => {
            eprintln!("Embedding images: {}/{}", progress.done, progress.total);
        }
        ProgressEvent::Status(message) => eprintln!("{message}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_percentage() {
        assert_eq!(Progress::new(6, 12).percentage(), 50.0);
        assert_eq!(Progress::new(0, 0).percentage(), 100.0);
    }

    #[test]
    fn test_progress_is_complete() {
        assert!(Progress::new(13, 13).is_complete());
        assert!(!Progress::new(12, 13).is_complete());
        assert_eq!(Progress::new(12, 13).remaining(), 1);
    }

    #[test]
    fn test_no_progress_callback() {
        let callback = no_progress();
        callback(ProgressEvent::status("ignored"));
    }

    #[test]
    fn test_progress_callback_records_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback = Arc::new(move |event| {
            sink.lock().unwrap().push(event);
        });

        callback(ProgressEvent::Images(Progress::new(1, 2)));
        callback(ProgressEvent::status("done"));

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ProgressEvent::Images(Progress::new(1, 2)));
        assert_eq!(events[1], ProgressEvent::Status("done".to_string()));
    }
}
