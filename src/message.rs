//! Session message type.
//!
//! This module provides [`Message`], one entry of a session transcript as
//! handed over by the host application. Messages are immutable inputs: the
//! pipeline borrows them and only ever produces modified copies.
//!
//! # Overview
//!
//! A message consists of:
//! - **Required**: `index`, `channel_key`, `channel_name`, `sender_name`, `kind`
//! - **Optional**: `sender_color`, `icon_ref`, `image_ref`, `text`,
//!   `dice_result`, `created_at`, `whisper_target`, `whisper_target_name`
//!
//! # Examples
//!
//! ```
//! use sessionlog::Message;
//! use chrono::Utc;
//!
//! let msg = Message::new(0, "Alice", "Hello!")
//!     .with_channel("main", "Main")
//!     .with_color("#ff8800")
//!     .with_created_at(Utc::now());
//!
//! assert_eq!(msg.sender_name(), "Alice");
//! assert_eq!(msg.text(), Some("Hello!"));
//! assert!(!msg.is_system());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a message was written by a participant or generated by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A participant message.
    #[default]
    Normal,
    /// A host-generated notice (joins, rule prompts, and the like).
    System,
}

/// One entry of a session transcript.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `index` | `usize` | Position in the original sequence, stable identity |
/// | `channel_key` | `String` | Channel identifier (empty means main) |
/// | `channel_name` | `String` | Channel display name |
/// | `sender_name` | `String` | Display name of the author |
/// | `sender_color` | `Option<String>` | Name color |
/// | `icon_ref` | `Option<String>` | Avatar image reference |
/// | `image_ref` | `Option<String>` | Attached image reference |
/// | `text` | `Option<String>` | Raw multi-line text |
/// | `dice_result` | `Option<String>` | Formatted dice roll result |
/// | `created_at` | `Option<DateTime<Utc>>` | When the message was posted |
/// | `whisper_target` | `Option<String>` | Recipient id of a whisper |
/// | `whisper_target_name` | `Option<String>` | Recipient display name |
/// | `kind` | `MessageKind` | Normal or system |
///
/// Serialized field names are camelCase and `None` fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Position in the original sequence.
    #[serde(default)]
    pub index: usize,

    /// Channel identifier.
    #[serde(default)]
    pub channel_key: String,

    /// Channel display name.
    #[serde(default)]
    pub channel_name: String,

    /// Display name of the author.
    #[serde(default)]
    pub sender_name: String,

    /// Name color, usually `#rrggbb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_color: Option<String>,

    /// Avatar image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_ref: Option<String>,

    /// Attached image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,

    /// Raw text, may span several lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Formatted dice roll result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dice_result: Option<String>,

    /// When the message was posted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Recipient id of a whisper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whisper_target: Option<String>,

    /// Recipient display name of a whisper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whisper_target_name: Option<String>,

    /// Normal or system message.
    #[serde(default)]
    pub kind: MessageKind,
}

impl Message {
    /// Creates a normal message in the main channel.
    ///
    /// ```rust
    /// use sessionlog::Message;
    ///
    /// let msg = Message::new(3, "Alice", "Hello!");
    /// assert_eq!(msg.index, 3);
    /// assert_eq!(msg.channel_key(), "main");
    /// assert!(msg.created_at().is_none());
    /// ```
    pub fn new(index: usize, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            index,
            channel_key: "main".to_string(),
            channel_name: "main".to_string(),
            sender_name: sender.into(),
            sender_color: None,
            icon_ref: None,
            image_ref: None,
            text: Some(text.into()),
            dice_result: None,
            created_at: None,
            whisper_target: None,
            whisper_target_name: None,
            kind: MessageKind::Normal,
        }
    }

    /// Creates a system message in the main channel.
    pub fn system(index: usize, text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::System,
            ..Self::new(index, "system", text)
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Sets the channel key and display name.
    #[must_use]
    pub fn with_channel(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.channel_key = key.into();
        self.channel_name = name.into();
        self
    }

    /// Sets the sender color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.sender_color = Some(color.into());
        self
    }

    /// Sets the avatar reference.
    #[must_use]
    pub fn with_icon(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = Some(icon_ref.into());
        self
    }

    /// Sets the attached image reference.
    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// Sets the dice roll result.
    #[must_use]
    pub fn with_dice(mut self, dice_result: impl Into<String>) -> Self {
        self.dice_result = Some(dice_result.into());
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub fn with_created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = Some(ts);
        self
    }

    /// Marks the message as a whisper to `target`.
    #[must_use]
    pub fn with_whisper(
        mut self,
        target: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Self {
        self.whisper_target = Some(target.into());
        self.whisper_target_name = Some(target_name.into());
        self
    }

    /// Sets the message kind.
    #[must_use]
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    // =========================================================================
    // Accessor methods
    // =========================================================================

    /// Returns the channel key, with an empty key read as `"main"`.
    pub fn channel_key(&self) -> &str {
        if self.channel_key.is_empty() {
            "main"
        } else {
            &self.channel_key
        }
    }

    /// Returns the sender name.
    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    /// Returns the text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the dice result, if any.
    pub fn dice_result(&self) -> Option<&str> {
        self.dice_result.as_deref()
    }

    /// Returns the creation timestamp, if any.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns `true` for messages of kind [`MessageKind::System`].
    ///
    /// Host notices posted under a system sender name are recognized by
    /// [`is_system_message`](crate::core::patterns::is_system_message).
    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }

    /// Returns `true` if the message is a whisper.
    pub fn is_whisper(&self) -> bool {
        self.whisper_target.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns the whisper recipient label, preferring the display name.
    pub fn whisper_label(&self) -> Option<&str> {
        if !self.is_whisper() {
            return None;
        }
        self.whisper_target_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.whisper_target.as_deref())
    }

    /// Returns the attached image unless it repeats the avatar.
    pub fn distinct_image(&self) -> Option<&str> {
        let image = self.image_ref.as_deref().filter(|r| !r.is_empty())?;
        if self.icon_ref.as_deref() == Some(image) {
            None
        } else {
            Some(image)
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new(0, "", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_new() {
        let msg = Message::new(0, "Alice", "Hello");
        assert_eq!(msg.sender_name(), "Alice");
        assert_eq!(msg.text(), Some("Hello"));
        assert_eq!(msg.kind, MessageKind::Normal);
        assert!(msg.created_at().is_none());
    }

    #[test]
    fn test_message_system() {
        let msg = Message::system(4, "Alice joined");
        assert!(msg.is_system());
        assert_eq!(msg.index, 4);
    }

    #[test]
    fn test_message_builder() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let msg = Message::new(1, "Alice", "Hello")
            .with_channel("other", "Side")
            .with_color("#123456")
            .with_icon("https://img/a.png")
            .with_dice("2D6 > 7")
            .with_created_at(ts);

        assert_eq!(msg.channel_key(), "other");
        assert_eq!(msg.channel_name, "Side");
        assert_eq!(msg.sender_color.as_deref(), Some("#123456"));
        assert_eq!(msg.dice_result(), Some("2D6 > 7"));
        assert_eq!(msg.created_at(), Some(ts));
    }

    #[test]
    fn test_empty_channel_key_reads_as_main() {
        let msg = Message::new(0, "Alice", "Hi").with_channel("", "");
        assert_eq!(msg.channel_key(), "main");
    }

    #[test]
    fn test_whisper_label_prefers_name() {
        let msg = Message::new(0, "Alice", "psst").with_whisper("u-42", "Bob");
        assert_eq!(msg.whisper_label(), Some("Bob"));

        let mut unnamed = Message::new(0, "Alice", "psst").with_whisper("u-42", "");
        assert_eq!(unnamed.whisper_label(), Some("u-42"));

        unnamed.whisper_target = Some(String::new());
        assert_eq!(unnamed.whisper_label(), None);
    }

    #[test]
    fn test_distinct_image_skips_avatar() {
        let same = Message::new(0, "Alice", "")
            .with_icon("a.png")
            .with_image("a.png");
        assert_eq!(same.distinct_image(), None);

        let other = Message::new(0, "Alice", "")
            .with_icon("a.png")
            .with_image("b.png");
        assert_eq!(other.distinct_image(), Some("b.png"));
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::new(2, "Alice", "Hello").with_dice("1D100 > 42");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"senderName\":\"Alice\""));
        assert!(json.contains("\"diceResult\""));
        assert!(!json.contains("createdAt"));
    }

    #[test]
    fn test_message_deserialization() {
        let json = r#"{"senderName":"Bob","text":"Hi","kind":"system","createdAt":"2024-06-15T12:00:00Z"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.sender_name(), "Bob");
        assert!(msg.is_system());
        assert_eq!(msg.channel_key(), "main");
        assert!(msg.created_at().is_some());
    }
}
