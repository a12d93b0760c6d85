//! Clash-block detection.
//!
//! A clash is a paired duel between two participants, written to the log as
//! a start marker, a number of round messages, and an end marker. The
//! detector runs once over the filtered transcript, before grouping, and
//! reports which positions each block covers so the grouping pass can
//! collapse the whole run into one summary row.
//!
//! ```rust
//! use sessionlog::Message;
//! use sessionlog::core::clash::detect_clashes;
//!
//! let messages = vec![
//!     Message::new(0, "GM", "Clash start: [Alice] vs [Bob]"),
//!     Message::new(1, "Alice", "Round 1").with_dice("1D6 > 5"),
//!     Message::new(2, "Bob", "Round 2").with_dice("1D6 > 2"),
//!     Message::new(3, "GM", "Clash end: [Alice] wins"),
//! ];
//! let refs: Vec<&Message> = messages.iter().collect();
//!
//! let clashes = detect_clashes(&refs);
//! assert_eq!(clashes.blocks.len(), 1);
//! assert_eq!(clashes.blocks[0].rounds, 2);
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::Message;
use crate::core::patterns::{ClashMarker, classify_clash_marker, name_tags};

/// Color used when a participant has no usable color.
pub const FALLBACK_COLOR: &str = "#d0d0d0";

/// Which side won a clash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WinnerSide {
    Attacker,
    Defender,
    Draw,
}

/// One participant of a clash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combatant {
    pub name: String,
    pub color: String,
    pub icon_ref: Option<String>,
}

impl Combatant {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            color: FALLBACK_COLOR.to_string(),
            icon_ref: None,
        }
    }
}

/// A detected clash, expressed as an inclusive range of positions in the
/// filtered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClashBlock {
    pub start_index: usize,
    pub end_index: usize,
    pub rounds: usize,
    pub is_draw: bool,
    pub attacker: Combatant,
    pub defender: Combatant,
    pub winner_side: WinnerSide,
    pub winner_dice_text: Option<String>,
}

impl ClashBlock {
    /// Returns the winning combatant, or `None` for a draw.
    pub fn winner(&self) -> Option<&Combatant> {
        match self.winner_side {
            WinnerSide::Attacker => Some(&self.attacker),
            WinnerSide::Defender => Some(&self.defender),
            WinnerSide::Draw => None,
        }
    }

    /// Number of filtered positions the block covers.
    pub fn len(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    /// Always `false`: a block covers at least its start and end.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Annotation of one covered position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMark {
    pub block_index: usize,
    pub is_start: bool,
}

/// Result of clash detection over one filtered sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClashAnnotations {
    /// Detected blocks, ordered by start position.
    pub blocks: Vec<ClashBlock>,
    /// Covered position -> block membership.
    pub marks: HashMap<usize, BlockMark>,
}

impl ClashAnnotations {
    /// Returns the mark for a filtered position, if it is covered.
    pub fn mark(&self, position: usize) -> Option<BlockMark> {
        self.marks.get(&position).copied()
    }

    /// Returns the block starting at `position`, if any.
    pub fn block_starting_at(&self, position: usize) -> Option<&ClashBlock> {
        self.mark(position)
            .filter(|mark| mark.is_start)
            .and_then(|mark| self.blocks.get(mark.block_index))
    }
}

/// Scans the filtered sequence for clash blocks.
///
/// Only the most recent unmatched start is tracked: a second start before
/// any end replaces the first one. Starts that are never closed produce no
/// block.
pub fn detect_clashes(messages: &[&Message]) -> ClashAnnotations {
    let mut annotations = ClashAnnotations::default();
    let mut open_start: Option<usize> = None;

    for (position, msg) in messages.iter().enumerate() {
        let Some(marker) = msg.text().and_then(classify_clash_marker) else {
            continue;
        };

        match marker {
            ClashMarker::Start => open_start = Some(position),
            end if end.is_end() => {
                let Some(start) = open_start.take() else {
                    continue;
                };
                let block = build_block(messages, start, position, end);
                let block_index = annotations.blocks.len();
                for covered in start..=position {
                    annotations.marks.insert(
                        covered,
                        BlockMark {
                            block_index,
                            is_start: covered == start,
                        },
                    );
                }
                annotations.blocks.push(block);
            }
            _ => {}
        }
    }

    tracing::debug!(blocks = annotations.blocks.len(), "detected clash blocks");
    annotations
}

fn build_block(
    messages: &[&Message],
    start: usize,
    end: usize,
    end_marker: ClashMarker,
) -> ClashBlock {
    let range = &messages[start..=end];
    let start_text = messages[start].text().unwrap_or_default();
    let tags = name_tags(start_text);

    let mut attacker = Combatant::named(tags.first().copied().unwrap_or_default());
    let mut defender = Combatant::named(tags.get(1).copied().unwrap_or_default());
    backfill(&mut attacker, range);
    backfill(&mut defender, range);

    let rounds = messages[start + 1..end]
        .iter()
        .filter(|msg| msg.text().and_then(classify_clash_marker) == Some(ClashMarker::Round))
        .count();

    let is_draw = matches!(end_marker, ClashMarker::Draw | ClashMarker::Abort);
    let winner_side = if is_draw {
        WinnerSide::Draw
    } else {
        let end_text = messages[end].text().unwrap_or_default();
        match name_tags(end_text).first() {
            Some(name) if *name == defender.name && *name != attacker.name => WinnerSide::Defender,
            _ => WinnerSide::Attacker,
        }
    };

    let winner_dice_text = match winner_side {
        WinnerSide::Attacker => last_dice_of(&attacker.name, range),
        WinnerSide::Defender => last_dice_of(&defender.name, range),
        WinnerSide::Draw => None,
    };

    ClashBlock {
        start_index: start,
        end_index: end,
        rounds,
        is_draw,
        attacker,
        defender,
        winner_side,
        winner_dice_text,
    }
}

fn backfill(combatant: &mut Combatant, range: &[&Message]) {
    if combatant.name.is_empty() {
        return;
    }
    let Some(first) = range.iter().find(|msg| msg.sender_name() == combatant.name) else {
        return;
    };
    if let Some(color) = first.sender_color.as_deref().filter(|c| !c.trim().is_empty()) {
        combatant.color = color.to_string();
    }
    combatant.icon_ref = first.icon_ref.clone().filter(|icon| !icon.is_empty());
}

fn last_dice_of(name: &str, range: &[&Message]) -> Option<String> {
    range
        .iter()
        .rev()
        .filter(|msg| msg.sender_name() == name)
        .find_map(|msg| msg.dice_result().filter(|d| !d.is_empty()))
        .map(str::to_string)
}
