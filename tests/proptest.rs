//! Property-based tests for sessionlog.
//!
//! These tests generate random session logs to find edge cases.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use sessionlog::Message;
use sessionlog::config::RenderSettings;
use sessionlog::core::output::{RenderMode, assemble, render_document};
use sessionlog::core::{
    FilterConfig, GroupingSettings, Row, apply_filters, detect_clashes, group_rows,
};
use sessionlog::preview::PreviewEvent;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
}

/// Generate a random Message using fast strategies (no regex!)
fn arb_message() -> impl Strategy<Value = Message> {
    (
        prop::sample::select(vec!["Alice", "Bob", "GM", "System", "田中"]),
        prop::sample::select(vec![
            "Hello",
            "Clash start: [Alice] vs [Bob]",
            "Round 1",
            "Round 2",
            "Clash end: [Bob] wins",
            "Clash draw",
            "multi\nline\n\n\n\ntext",
            "<b>tag</b> & \"quote\"",
            "",
        ]),
        prop::sample::select(vec!["", "main", "ooc", "secret"]),
        prop::option::of(0i64..5000),
        any::<bool>(),
    )
        .prop_map(|(sender, text, channel, minutes, dice)| {
            let mut msg = Message::new(0, sender, text).with_channel(channel, channel);
            if let Some(minutes) = minutes {
                msg = msg.with_created_at(base_time() + chrono::TimeDelta::minutes(minutes));
            }
            if dice {
                msg = msg.with_dice("2D6 > 7");
            }
            msg
        })
}

/// Generate a session with indices matching positions.
fn arb_messages(max_len: usize) -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec(arb_message(), 0..max_len).prop_map(|mut messages| {
        for (i, msg) in messages.iter_mut().enumerate() {
            msg.index = i;
        }
        messages
    })
}

fn arb_filter() -> impl Strategy<Value = FilterConfig> {
    (
        prop::collection::btree_set(0usize..40, 0..6),
        prop::sample::select(vec!["", "round", "clash", "alice"]),
        any::<bool>(),
    )
        .prop_map(|(excluded, search, hide_ooc)| {
            let mut config = FilterConfig::new().with_search(search);
            for index in excluded {
                config = config.with_excluded(index);
            }
            if hide_ooc {
                config = config.with_channel_enabled("ooc", false);
            }
            config
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ============================================
    // FILTER PROPERTIES
    // ============================================

    /// Filtering yields an ordered subsequence of the input
    #[test]
    fn filter_is_ordered_subsequence(messages in arb_messages(40), filter in arb_filter()) {
        let filtered = apply_filters(&messages, &filter);
        prop_assert!(filtered.len() <= messages.len());
        for pair in filtered.windows(2) {
            prop_assert!(pair[0].index < pair[1].index);
        }
        for msg in &filtered {
            prop_assert_eq!(*msg, &messages[msg.index]);
        }
    }

    /// An empty filter keeps everything
    #[test]
    fn empty_filter_keeps_all(messages in arb_messages(40)) {
        let filtered = apply_filters(&messages, &FilterConfig::new());
        prop_assert_eq!(filtered.len(), messages.len());
    }

    /// Excluded indices never survive
    #[test]
    fn excluded_never_survive(messages in arb_messages(40), filter in arb_filter()) {
        let filtered = apply_filters(&messages, &filter);
        for msg in filtered {
            prop_assert!(!filter.excluded_indices.contains(&msg.index));
        }
    }

    /// Toggling the same index twice restores the snapshot
    #[test]
    fn toggle_twice_is_identity(filter in arb_filter(), index in 0usize..40) {
        let event = PreviewEvent::ToggleExclude { index };
        let restored = event.apply(&event.apply(&filter));
        prop_assert_eq!(restored, filter);
    }

    // ============================================
    // CLASH PROPERTIES
    // ============================================

    /// Blocks are in order, disjoint and within bounds
    #[test]
    fn clash_blocks_are_disjoint(messages in arb_messages(40)) {
        let refs: Vec<&Message> = messages.iter().collect();
        let clashes = detect_clashes(&refs);
        let mut last_end = None;
        for block in &clashes.blocks {
            prop_assert!(block.start_index < block.end_index);
            prop_assert!(block.end_index < refs.len());
            if let Some(end) = last_end {
                prop_assert!(block.start_index > end);
            }
            last_end = Some(block.end_index);
        }
    }

    // ============================================
    // GROUPING PROPERTIES
    // ============================================

    /// Every filtered message is rendered exactly once
    #[test]
    fn grouping_covers_every_message(messages in arb_messages(40)) {
        let refs: Vec<&Message> = messages.iter().collect();
        let clashes = detect_clashes(&refs);
        let rows = group_rows(&refs, &clashes, &GroupingSettings::default());

        let mut seen = Vec::new();
        for row in &rows {
            match row {
                Row::System(batch) => seen.extend(batch.iter().map(|m| m.index)),
                Row::OpenCluster(msg) | Row::ClusterRow(msg) => seen.push(msg.index),
                Row::Clash { messages, .. } => seen.extend(messages.iter().map(|m| m.index)),
                _ => {}
            }
        }
        let expected: Vec<usize> = (0..messages.len()).collect();
        prop_assert_eq!(seen, expected);
    }

    /// Cluster and alt section markers are balanced
    #[test]
    fn grouping_markers_balance(messages in arb_messages(40)) {
        let refs: Vec<&Message> = messages.iter().collect();
        let clashes = detect_clashes(&refs);
        let rows = group_rows(&refs, &clashes, &GroupingSettings::default());

        let mut clusters = 0i32;
        let mut sections = 0i32;
        for row in &rows {
            match row {
                Row::OpenCluster(_) => clusters += 1,
                Row::CloseCluster => clusters -= 1,
                Row::OpenAltSection => sections += 1,
                Row::CloseAltSection => sections -= 1,
                _ => {}
            }
            prop_assert!((0..=1).contains(&clusters));
            prop_assert!((0..=1).contains(&sections));
        }
        prop_assert_eq!(clusters, 0);
        prop_assert_eq!(sections, 0);
    }

    // ============================================
    // RENDERING PROPERTIES
    // ============================================

    /// Chunked assembly concatenates to the single-pass document
    #[test]
    fn chunks_concat_to_document(messages in arb_messages(40)) {
        let refs: Vec<&Message> = messages.iter().collect();
        let settings = RenderSettings::default();
        let chunks = assemble(&refs, &settings, RenderMode::Document).unwrap();
        let single = render_document(&refs, &settings, RenderMode::Document).unwrap();
        prop_assert!(chunks.len() >= 2);
        prop_assert_eq!(chunks.concat(), single);
    }

    /// Raw markup from message text never reaches the document
    #[test]
    fn text_is_always_escaped(messages in arb_messages(20)) {
        let refs: Vec<&Message> = messages.iter().collect();
        let html =
            render_document(&refs, &RenderSettings::default(), RenderMode::Document).unwrap();
        prop_assert!(!html.contains("<b>tag</b>"));
    }
}
