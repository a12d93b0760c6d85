//! Predicate tables used by clash detection and grouping.
//!
//! All string matching policy lives here so it can be audited and tested in
//! one place:
//!
//! | Table | Used by |
//! |-------|---------|
//! | [`CLASH_MARKERS`] | [`classify_clash_marker`], clash detection |
//! | [`MAIN_CHANNEL_ALIASES`] | [`is_main_channel`], alt sections |
//! | [`SYSTEM_SENDER_ALIASES`] | [`is_system_message`], system buffers |

use std::sync::LazyLock;

use regex::Regex;

use crate::Message;

/// Kind of clash marker recognized in a message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClashMarker {
    /// Opens an engagement: `Clash start: [Alice] vs [Bob]`.
    Start,
    /// One exchange inside an engagement: `Round 2`.
    Round,
    /// Closes an engagement with a winner: `Clash end: [Alice] wins`.
    Win,
    /// Closes an engagement without a winner.
    Draw,
    /// Closes an engagement that was called off.
    Abort,
}

impl ClashMarker {
    /// Returns `true` for the markers that close an engagement.
    pub fn is_end(self) -> bool {
        matches!(self, ClashMarker::Win | ClashMarker::Draw | ClashMarker::Abort)
    }
}

/// Marker patterns, checked in order. End markers come before the start
/// marker so a text such as `Clash end` is never read as an opening.
pub static CLASH_MARKERS: &[(ClashMarker, &str)] = &[
    (ClashMarker::Draw, r"(?i)clash\s*draw"),
    (ClashMarker::Abort, r"(?i)clash\s*(?:abort(?:ed)?|cancel(?:l?ed)?)"),
    (ClashMarker::Win, r"(?i)clash\s*(?:end|won|win)"),
    (ClashMarker::Start, r"(?i)clash\s*start|【\s*clash"),
    (ClashMarker::Round, r"(?i)\bround\s*\d+"),
];

static COMPILED_MARKERS: LazyLock<Vec<(ClashMarker, Regex)>> = LazyLock::new(|| {
    CLASH_MARKERS
        .iter()
        .filter_map(|(marker, pattern)| Regex::new(pattern).ok().map(|re| (*marker, re)))
        .collect()
});

static NAME_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]\n]+)\]").ok());

/// Channel keys and names treated as the main channel (compared
/// case-insensitively after trimming).
pub static MAIN_CHANNEL_ALIASES: &[&str] = &["main", "メイン", "メインタブ"];

/// Sender names that mark a host notice even when the message kind is normal.
pub static SYSTEM_SENDER_ALIASES: &[&str] = &["system", "システム"];

/// Classifies a message text against [`CLASH_MARKERS`].
///
/// ```rust
/// use sessionlog::core::patterns::{ClashMarker, classify_clash_marker};
///
/// assert_eq!(classify_clash_marker("Clash start: [A] vs [B]"), Some(ClashMarker::Start));
/// assert_eq!(classify_clash_marker("Round 3"), Some(ClashMarker::Round));
/// assert_eq!(classify_clash_marker("just chatting"), None);
/// ```
pub fn classify_clash_marker(text: &str) -> Option<ClashMarker> {
    COMPILED_MARKERS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(marker, _)| *marker)
}

/// Returns the `[name]` tokens of a text, in order.
pub fn name_tags(text: &str) -> Vec<&str> {
    let Some(re) = NAME_TAG.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Returns `true` if the message belongs to the main channel.
pub fn is_main_channel(message: &Message) -> bool {
    let key = message.channel_key();
    matches_alias(key, MAIN_CHANNEL_ALIASES)
        || matches_alias(&message.channel_name, MAIN_CHANNEL_ALIASES)
}

/// Returns `true` for system messages: explicit kind, or a system sender.
pub fn is_system_message(message: &Message) -> bool {
    message.is_system() || matches_alias(&message.sender_name, SYSTEM_SENDER_ALIASES)
}

fn matches_alias(value: &str, aliases: &[&str]) -> bool {
    let value = value.trim();
    aliases.iter().any(|alias| value.eq_ignore_ascii_case(alias))
}
