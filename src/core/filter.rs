//! Filter messages by channel, date/time window, search text and exclusions.
//!
//! This module provides [`FilterConfig`] for defining filter criteria and
//! [`apply_filters`] for filtering a transcript.
//!
//! # Filter Types
//!
//! | Filter | Method | Description |
//! |--------|--------|-------------|
//! | Exclusion | [`with_excluded`](FilterConfig::with_excluded) | Drop single messages by index |
//! | Channel | [`with_channel_enabled`](FilterConfig::with_channel_enabled) | Hide whole channels |
//! | Date from | [`with_date_from`](FilterConfig::with_date_from) | Messages on or after a day |
//! | Date to | [`with_date_to`](FilterConfig::with_date_to) | Messages on or before a day |
//! | Time from/to | [`with_time_from`](FilterConfig::with_time_from), [`with_time_to`](FilterConfig::with_time_to) | Narrow the first/last day |
//! | Search | [`with_search`](FilterConfig::with_search) | Case-insensitive substring |
//!
//! # Examples
//!
//! ```
//! use sessionlog::core::filter::{FilterConfig, apply_filters};
//! use sessionlog::Message;
//!
//! let messages = vec![
//!     Message::new(0, "Alice", "Hello"),
//!     Message::new(1, "Bob", "Hi there").with_channel("side", "Side"),
//!     Message::new(2, "Alice", "How are you?"),
//! ];
//!
//! let config = FilterConfig::new()
//!     .with_channel_enabled("side", false)
//!     .with_excluded(2);
//! let filtered = apply_filters(&messages, &config);
//!
//! assert_eq!(filtered.len(), 1);
//! assert_eq!(filtered[0].index, 0);
//! ```
//!
//! # Behavior Notes
//!
//! - Messages without timestamps are **never** excluded by date or time
//! - Time bounds only narrow the first and last covered day
//! - Multiple filters are combined with AND logic
//! - Order and `index` values of retained messages are preserved

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc};

use crate::Message;
use crate::error::ExportError;

/// Configuration for filtering a transcript.
///
/// A filter config is an immutable snapshot: owners build the next snapshot
/// (for example with [`toggled_exclusion`](Self::toggled_exclusion)) instead
/// of mutating one shared instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Per-channel switch. Channels absent from the map are enabled.
    pub channel_enabled: HashMap<String, bool>,

    /// First day to include (inclusive).
    pub date_from: Option<NaiveDate>,

    /// Last day to include (inclusive).
    pub date_to: Option<NaiveDate>,

    /// Time of day at which `date_from` starts.
    pub time_from: NaiveTime,

    /// Time of day at which `date_to` ends.
    pub time_to: NaiveTime,

    /// Case-insensitive substring over text, sender and dice result.
    pub search_text: String,

    /// Message indices removed by hand.
    pub excluded_indices: BTreeSet<usize>,

    /// Offset that defines "local" midnight for the day bounds.
    pub utc_offset: FixedOffset,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            channel_enabled: HashMap::new(),
            date_from: None,
            date_to: None,
            time_from: day_start(),
            time_to: day_end_minute(),
            search_text: String::new(),
            excluded_indices: BTreeSet::new(),
            utc_offset: utc(),
        }
    }
}

impl FilterConfig {
    /// Creates a new empty filter configuration.
    ///
    /// No filters are active by default; all messages pass through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first day to include. Date format: `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidDate`] if the format is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use sessionlog::core::filter::FilterConfig;
    ///
    /// # fn main() -> sessionlog::Result<()> {
    /// let config = FilterConfig::new().with_date_from("2024-01-01")?;
    /// assert!(config.is_active());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_date_from(mut self, date_str: &str) -> Result<Self, ExportError> {
        self.date_from = Some(parse_date(date_str)?);
        Ok(self)
    }

    /// Sets the last day to include. Date format: `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidDate`] if the format is invalid.
    pub fn with_date_to(mut self, date_str: &str) -> Result<Self, ExportError> {
        self.date_to = Some(parse_date(date_str)?);
        Ok(self)
    }

    /// Sets the time of day the first day starts at. Format: `HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidTime`] if the format is invalid.
    pub fn with_time_from(mut self, time_str: &str) -> Result<Self, ExportError> {
        self.time_from = parse_time(time_str)?;
        Ok(self)
    }

    /// Sets the time of day the last day ends at. Format: `HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidTime`] if the format is invalid.
    pub fn with_time_to(mut self, time_str: &str) -> Result<Self, ExportError> {
        self.time_to = parse_time(time_str)?;
        Ok(self)
    }

    /// Sets the search text.
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Enables or disables a channel.
    #[must_use]
    pub fn with_channel_enabled(mut self, channel_key: impl Into<String>, enabled: bool) -> Self {
        self.channel_enabled.insert(channel_key.into(), enabled);
        self
    }

    /// Excludes one message by index.
    #[must_use]
    pub fn with_excluded(mut self, index: usize) -> Self {
        self.excluded_indices.insert(index);
        self
    }

    /// Sets the offset used to resolve day bounds.
    #[must_use]
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Returns the next snapshot with `index` excluded if it was included
    /// and included if it was excluded.
    ///
    /// ```
    /// use sessionlog::core::filter::FilterConfig;
    ///
    /// let base = FilterConfig::new();
    /// let toggled = base.toggled_exclusion(7);
    /// assert!(toggled.excluded_indices.contains(&7));
    /// assert_eq!(toggled.toggled_exclusion(7), base);
    /// ```
    #[must_use]
    pub fn toggled_exclusion(&self, index: usize) -> Self {
        let mut next = self.clone();
        if !next.excluded_indices.remove(&index) {
            next.excluded_indices.insert(index);
        }
        next
    }

    /// Checks the `date_from <= date_to` invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidDateRange`] if the range is inverted.
    pub fn validate(&self) -> Result<(), ExportError> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) if from > to => Err(ExportError::invalid_date_range(from, to)),
            _ => Ok(()),
        }
    }

    /// Returns `true` if any filter is active.
    pub fn is_active(&self) -> bool {
        self.date_from.is_some()
            || self.date_to.is_some()
            || !self.search_text.is_empty()
            || !self.excluded_indices.is_empty()
            || self.channel_enabled.values().any(|enabled| !enabled)
    }

    /// Returns `true` if the channel is enabled.
    pub fn is_channel_enabled(&self, channel_key: &str) -> bool {
        self.channel_enabled
            .get(channel_key)
            .copied()
            .unwrap_or(true)
    }

    /// Lower bound of the window: `date_from` at local midnight, moved to
    /// `time_from` unless that is `00:00`.
    pub fn effective_from(&self) -> Option<DateTime<Utc>> {
        let date = self.date_from?;
        self.resolve_local(date, self.time_from)
    }

    /// Upper bound of the window: `date_to` at the end of the local day,
    /// moved to `time_to` unless that is `23:59`. The seconds of the last
    /// minute stay included.
    pub fn effective_to(&self) -> Option<DateTime<Utc>> {
        let date = self.date_to?;
        let end = self.time_to + TimeDelta::milliseconds(59_999);
        self.resolve_local(date, end)
    }

    /// Returns `true` if the message passes every active filter.
    pub fn matches(&self, msg: &Message) -> bool {
        self.matches_with_window(msg, self.effective_from(), self.effective_to())
    }

    fn matches_with_window(
        &self,
        msg: &Message,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> bool {
        if self.excluded_indices.contains(&msg.index) {
            return false;
        }

        if !self.is_channel_enabled(msg.channel_key()) {
            return false;
        }

        if let Some(ts) = msg.created_at {
            if from.is_some_and(|from| ts < from) {
                return false;
            }
            if to.is_some_and(|to| ts > to) {
                return false;
            }
        }

        if !self.search_text.is_empty() && !matches_search(msg, &self.search_text) {
            return false;
        }

        true
    }

    fn resolve_local(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.utc_offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn matches_search(msg: &Message, needle: &str) -> bool {
    let haystack = format!(
        "{} {} {}",
        msg.text().unwrap_or_default(),
        msg.sender_name(),
        msg.dice_result().unwrap_or_default()
    );
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn parse_date(date_str: &str) -> Result<NaiveDate, ExportError> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| ExportError::invalid_date(date_str))
}

fn parse_time(time_str: &str) -> Result<NaiveTime, ExportError> {
    NaiveTime::parse_from_str(time_str.trim(), "%H:%M")
        .map_err(|_| ExportError::invalid_time(time_str))
}

fn day_start() -> NaiveTime {
    NaiveTime::MIN
}

fn day_end_minute() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Filters a transcript based on the provided configuration.
///
/// Returns references to the retained messages, in their original order and
/// with their original `index`.
///
/// # Examples
///
/// ```
/// use sessionlog::core::filter::{FilterConfig, apply_filters};
/// use sessionlog::Message;
///
/// let messages = vec![
///     Message::new(0, "Alice", "Roll for initiative"),
///     Message::new(1, "Bob", "ok").with_dice("1D20 > 17"),
/// ];
///
/// let filtered = apply_filters(&messages, &FilterConfig::new().with_search("1d20"));
/// assert_eq!(filtered.len(), 1);
/// assert_eq!(filtered[0].sender_name(), "Bob");
/// ```
pub fn apply_filters<'a>(messages: &'a [Message], config: &FilterConfig) -> Vec<&'a Message> {
    let from = config.effective_from();
    let to = config.effective_to();

    let filtered: Vec<&Message> = messages
        .iter()
        .filter(|msg| config.matches_with_window(msg, from, to))
        .collect();

    tracing::debug!(
        input = messages.len(),
        retained = filtered.len(),
        "filtered transcript"
    );

    filtered
}
