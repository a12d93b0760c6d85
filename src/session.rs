//! Session log and settings file loading.
//!
//! A session log is JSON, either a bare array of messages or an object with
//! a `title` and a `messages` array. Message fields are camelCase, as in
//! [`Message`]'s serde representation. Indices are reassigned from position
//! so they always form a stable zero-based identity.
//!
//! ```rust
//! use sessionlog::session::parse_session;
//!
//! let log = parse_session(r#"{"title":"Night 1","messages":[{"senderName":"Alice","text":"Hi"}]}"#).unwrap();
//! assert_eq!(log.title.as_deref(), Some("Night 1"));
//! assert_eq!(log.messages[0].index, 0);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Message;
use crate::config::{ExportOptions, RenderSettings};
use crate::error::Result;

/// A loaded transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionLog {
    /// Title stored in the log, if any.
    pub title: Option<String>,
    /// Messages in original order.
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SessionShape {
    Bare(Vec<Message>),
    Titled {
        #[serde(default)]
        title: Option<String>,
        messages: Vec<Message>,
    },
}

/// Parses a session log from a JSON string.
///
/// # Errors
///
/// Returns [`ExportError::Json`](crate::ExportError::Json) if the input is
/// neither shape.
pub fn parse_session(content: &str) -> Result<SessionLog> {
    let (title, mut messages) = match serde_json::from_str(content)? {
        SessionShape::Bare(messages) => (None, messages),
        SessionShape::Titled { title, messages } => (title, messages),
    };
    for (index, msg) in messages.iter_mut().enumerate() {
        msg.index = index;
    }
    tracing::debug!(messages = messages.len(), "parsed session log");
    Ok(SessionLog {
        title: title.filter(|t| !t.trim().is_empty()),
        messages,
    })
}

/// Reads and parses a session log file.
///
/// # Errors
///
/// Returns an IO error if the file cannot be read, or a JSON error if it
/// cannot be parsed.
pub fn load_session(path: impl AsRef<Path>) -> Result<SessionLog> {
    let content = fs::read_to_string(path)?;
    parse_session(&content)
}

/// Contents of a settings file: `{ "render": {...}, "export": {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsFile {
    pub render: RenderSettings,
    pub export: ExportOptions,
}

impl SettingsFile {
    /// Parses settings from a JSON string. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the input is malformed.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a JSON error if it
    /// cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
