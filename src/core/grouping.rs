//! Grouping of filtered messages into render rows.
//!
//! [`group_rows`] walks the filtered transcript once and decides the visual
//! structure of the document: date separators, channel headers, alternate
//! channel sections, sender clusters, buffered system notices, and collapsed
//! clash blocks. Rows borrow the messages; rendering happens separately in
//! [`crate::core::output::html`].

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeDelta, Utc};

use crate::Message;
use crate::core::clash::{ClashAnnotations, ClashBlock};
use crate::core::patterns::{is_main_channel, is_system_message};

/// Default gap after which a sender cluster or system buffer is split.
pub const DEFAULT_GROUP_THRESHOLD: TimeDelta = TimeDelta::minutes(10);

/// Settings for one grouping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingSettings {
    /// Zone in which calendar days are compared.
    pub display_offset: FixedOffset,
    /// Maximum time since a cluster (or system buffer) started for a new
    /// message to join it.
    pub threshold: TimeDelta,
}

impl Default for GroupingSettings {
    fn default() -> Self {
        Self {
            display_offset: Utc.fix(),
            threshold: DEFAULT_GROUP_THRESHOLD,
        }
    }
}

impl GroupingSettings {
    /// Creates settings with the default threshold in the given zone.
    pub fn new(display_offset: FixedOffset) -> Self {
        Self {
            display_offset,
            ..Self::default()
        }
    }

    /// Sets the cluster threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: TimeDelta) -> Self {
        self.threshold = threshold;
        self
    }
}

/// One structural element of the rendered document.
#[derive(Debug, Clone, PartialEq)]
pub enum Row<'a> {
    /// A new calendar day starts.
    DateSeparator(NaiveDate),
    /// A new channel run starts. `alt` is set for non-main channels.
    ChannelHeader { name: &'a str, alt: bool },
    /// Opens the wrapper of a non-main channel run.
    OpenAltSection,
    /// Closes the wrapper of a non-main channel run.
    CloseAltSection,
    /// Consecutive system notices rendered together.
    System(Vec<&'a Message>),
    /// Cluster header plus the first content row.
    OpenCluster(&'a Message),
    /// Content row continuing the open cluster.
    ClusterRow(&'a Message),
    /// Closes the open cluster.
    CloseCluster,
    /// Separator between clusters of different senders.
    Divider,
    /// A collapsed clash block with every message it covers.
    Clash {
        block: &'a ClashBlock,
        messages: Vec<&'a Message>,
    },
}

#[derive(Default)]
struct GroupingState<'a> {
    rows: Vec<Row<'a>>,
    previous_date: Option<NaiveDate>,
    previous_sender: Option<&'a str>,
    previous_channel: Option<&'a str>,
    group_start: Option<DateTime<Utc>>,
    system_buffer: Vec<&'a Message>,
    system_start: Option<DateTime<Utc>>,
    alt_open: bool,
    cluster_open: bool,
}

impl<'a> GroupingState<'a> {
    fn close_cluster(&mut self) {
        if self.cluster_open {
            self.rows.push(Row::CloseCluster);
            self.cluster_open = false;
        }
    }

    fn flush_system(&mut self) {
        if !self.system_buffer.is_empty() {
            let buffered = std::mem::take(&mut self.system_buffer);
            self.rows.push(Row::System(buffered));
        }
        self.system_start = None;
    }

    fn close_alt(&mut self) {
        if self.alt_open {
            self.rows.push(Row::CloseAltSection);
            self.alt_open = false;
        }
    }

    fn reset_sender(&mut self) {
        self.previous_sender = None;
        self.group_start = None;
    }

    fn push_system(&mut self, msg: &'a Message, threshold: TimeDelta) {
        self.close_cluster();
        self.reset_sender();
        if !self.system_buffer.is_empty()
            && elapsed(self.system_start, msg.created_at()) >= threshold
        {
            self.flush_system();
        }
        if self.system_buffer.is_empty() {
            self.system_start = msg.created_at();
        }
        self.system_buffer.push(msg);
    }

    fn push_ordinary(&mut self, msg: &'a Message, channel: &'a str, threshold: TimeDelta) {
        self.flush_system();
        let sender = msg.sender_name();
        let continues = self.cluster_open
            && self.previous_sender == Some(sender)
            && self.previous_channel == Some(channel)
            && elapsed(self.group_start, msg.created_at()) < threshold;

        if continues {
            self.rows.push(Row::ClusterRow(msg));
            return;
        }

        self.close_cluster();
        if self.previous_sender.is_some_and(|prev| prev != sender) {
            self.rows.push(Row::Divider);
        }
        self.rows.push(Row::OpenCluster(msg));
        self.cluster_open = true;
        self.previous_sender = Some(sender);
        self.group_start = msg.created_at();
    }

    fn finish(mut self) -> Vec<Row<'a>> {
        self.flush_system();
        self.close_cluster();
        self.close_alt();
        self.rows
    }
}

/// Missing timestamps on either side count as no elapsed time.
fn elapsed(start: Option<DateTime<Utc>>, now: Option<DateTime<Utc>>) -> TimeDelta {
    match (start, now) {
        (Some(start), Some(now)) => now - start,
        _ => TimeDelta::zero(),
    }
}

/// Builds the row sequence for a filtered transcript.
///
/// Positions in `clashes` refer to `filtered`, so the annotations must come
/// from [`detect_clashes`](crate::core::clash::detect_clashes) over the same
/// slice.
pub fn group_rows<'a>(
    filtered: &[&'a Message],
    clashes: &'a ClashAnnotations,
    settings: &GroupingSettings,
) -> Vec<Row<'a>> {
    let mut state = GroupingState::default();
    let mut position = 0;

    while position < filtered.len() {
        let msg = filtered[position];

        let mark = clashes.mark(position);
        if mark.is_some_and(|m| !m.is_start) {
            position += 1;
            continue;
        }

        if let Some(date) = msg
            .created_at()
            .map(|ts| ts.with_timezone(&settings.display_offset).date_naive())
        {
            if state.previous_date != Some(date) {
                state.close_cluster();
                state.flush_system();
                state.close_alt();
                state.rows.push(Row::DateSeparator(date));
                state.previous_date = Some(date);
                state.previous_channel = None;
                state.reset_sender();
            }
        }

        let channel = msg.channel_key();
        if state.previous_channel != Some(channel) {
            state.close_cluster();
            state.flush_system();
            state.close_alt();
            let alt = !is_main_channel(msg);
            if alt {
                state.rows.push(Row::OpenAltSection);
                state.alt_open = true;
            }
            state.rows.push(Row::ChannelHeader {
                name: channel_display_name(msg),
                alt,
            });
            state.previous_channel = Some(channel);
            state.reset_sender();
        }

        if let Some(block) = clashes.block_starting_at(position) {
            state.close_cluster();
            state.flush_system();
            let end = block.end_index.min(filtered.len() - 1);
            state.rows.push(Row::Clash {
                block,
                messages: filtered[position..=end].to_vec(),
            });
            state.reset_sender();
            position = end + 1;
            continue;
        }

        if is_system_message(msg) {
            state.push_system(msg, settings.threshold);
        } else {
            state.push_ordinary(msg, channel, settings.threshold);
        }
        position += 1;
    }

    let rows = state.finish();
    tracing::debug!(messages = filtered.len(), rows = rows.len(), "grouped rows");
    rows
}

fn channel_display_name(msg: &Message) -> &str {
    let name = msg.channel_name.trim();
    if name.is_empty() { msg.channel_key() } else { name }
}
