//! Edge case tests for sessionlog
//!
//! Boundary conditions that cut across modules: hostile text, odd
//! timestamps, empty inputs and degenerate clash markers.

use chrono::{FixedOffset, TimeZone, Utc};
use sessionlog::Message;
use sessionlog::config::RenderSettings;
use sessionlog::core::output::{RenderMode, extract_clipboard_fragment, render_document};
use sessionlog::core::{
    FilterConfig, GroupingSettings, Row, apply_filters, detect_clashes, group_rows,
};
use sessionlog::session::parse_session;

fn render(messages: &[Message]) -> String {
    let refs: Vec<&Message> = messages.iter().collect();
    render_document(&refs, &RenderSettings::default(), RenderMode::Document).unwrap()
}

// =========================================================================
// Escaping
// =========================================================================

#[test]
fn test_script_in_text_is_escaped() {
    let html = render(&[Message::new(0, "Mallory", "<script>alert('x')</script>")]);
    assert!(!html.contains("<script>alert"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn test_hostile_sender_and_color() {
    let msg = Message::new(0, "\"><img src=x>", "hi").with_color("red;background:url(x)");
    let html = render(&[msg]);
    assert!(!html.contains("\"><img src=x>"));
    assert!(!html.contains("url(x)"));
}

#[test]
fn test_hostile_title() {
    let settings = RenderSettings::new().with_title("</title><script>");
    let msg = Message::new(0, "A", "x");
    let html = render_document(&[&msg], &settings, RenderMode::Document).unwrap();
    assert!(html.contains("<title>&lt;/title&gt;&lt;script&gt;</title>"));
}

#[test]
fn test_unicode_survives_rendering() {
    let html = render(&[
        Message::new(0, "田中太郎", "こんにちは世界！"),
        Message::new(1, "Иван", "Привет 🎲"),
    ]);
    assert!(html.contains("田中太郎"));
    assert!(html.contains("こんにちは世界！"));
    assert!(html.contains("Привет 🎲"));
}

// =========================================================================
// Text shapes
// =========================================================================

#[test]
fn test_blank_text_renders_no_text_div() {
    let html = render(&[Message::new(0, "A", "\n\n   \n").with_dice("1D6 > 3")]);
    assert!(!html.contains("<div class=\"text\">"));
    assert!(html.contains("1D6 &gt; 3"));
}

#[test]
fn test_long_blank_runs_collapse() {
    let html = render(&[Message::new(0, "A", "one\n\n\n\n\ntwo")]);
    assert!(html.contains("one<br><br>two"));
}

// =========================================================================
// Timestamps
// =========================================================================

#[test]
fn test_messages_without_timestamps_render() {
    let html = render(&[Message::new(0, "A", "first"), Message::new(1, "A", "second")]);
    assert!(html.contains("first"));
    assert!(html.contains("second"));
    assert!(!html.contains("class=\"date-separator\""));
}

#[test]
fn test_date_filter_keeps_undated_messages() {
    let ts = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let messages = vec![
        Message::new(0, "A", "dated").with_created_at(ts),
        Message::new(1, "A", "undated"),
    ];
    let filter = FilterConfig::new().with_date_from("2024-07-01").unwrap();
    let filtered = apply_filters(&messages, &filter);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].index, 1);
}

#[test]
fn test_midnight_crossing_in_display_offset() {
    // 14:30 UTC is 23:30 in UTC+9; 15:30 UTC is 00:30 the next local day.
    let messages = vec![
        Message::new(0, "A", "late")
            .with_created_at(Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap()),
        Message::new(1, "A", "early")
            .with_created_at(Utc.with_ymd_and_hms(2024, 6, 15, 15, 30, 0).unwrap()),
    ];
    let refs: Vec<&Message> = messages.iter().collect();
    let clashes = detect_clashes(&refs);
    let settings = GroupingSettings::new(FixedOffset::east_opt(9 * 3600).unwrap());
    let rows = group_rows(&refs, &clashes, &settings);

    let separators: Vec<String> = rows
        .iter()
        .filter_map(|row| match row {
            Row::DateSeparator(date) => Some(date.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(separators, vec!["2024-06-15", "2024-06-16"]);
}

#[test]
fn test_time_to_includes_the_whole_minute() {
    let tz = FixedOffset::east_opt(0).unwrap();
    let messages = vec![
        Message::new(0, "A", "in")
            .with_created_at(Utc.with_ymd_and_hms(2024, 6, 15, 22, 0, 59).unwrap()),
        Message::new(1, "A", "out")
            .with_created_at(Utc.with_ymd_and_hms(2024, 6, 15, 22, 1, 0).unwrap()),
    ];
    let filter = FilterConfig::new()
        .with_utc_offset(tz)
        .with_date_to("2024-06-15")
        .unwrap()
        .with_time_to("22:00")
        .unwrap();
    let filtered = apply_filters(&messages, &filter);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].index, 0);
}

// =========================================================================
// Clash markers
// =========================================================================

#[test]
fn test_clash_start_without_tags_uses_blank_combatants() {
    let messages = vec![
        Message::new(0, "GM", "clash start"),
        Message::new(1, "GM", "clash draw"),
    ];
    let refs: Vec<&Message> = messages.iter().collect();
    let clashes = detect_clashes(&refs);
    assert_eq!(clashes.blocks.len(), 1);
    assert_eq!(clashes.blocks[0].rounds, 0);

    let html = render(&messages);
    assert!(html.contains("0 rounds"));
    assert!(html.contains("Draw"));
}

#[test]
fn test_single_round_is_singular() {
    let messages = vec![
        Message::new(0, "GM", "Clash start: [A] vs [B]"),
        Message::new(1, "A", "Round 1"),
        Message::new(2, "GM", "Clash end: [B] wins"),
    ];
    let html = render(&messages);
    assert!(html.contains("1 round<"));
    assert!(html.contains("Winner: B"));
}

// =========================================================================
// Input and extraction
// =========================================================================

#[test]
fn test_empty_session_array() {
    let log = parse_session("[]").unwrap();
    assert!(log.messages.is_empty());
    assert!(apply_filters(&log.messages, &FilterConfig::new()).is_empty());
}

#[test]
fn test_unknown_message_fields_are_ignored() {
    let log = parse_session(r#"[{"senderName": "A", "text": "x", "reactions": [1, 2]}]"#).unwrap();
    assert_eq!(log.messages.len(), 1);
}

#[test]
fn test_clipboard_extract_of_foreign_markup() {
    let err = extract_clipboard_fragment(&["<p>no document here</p>".to_string()]).unwrap_err();
    assert!(err.is_clipboard_extract());
}

#[test]
fn test_excluded_index_out_of_range_is_harmless() {
    let messages = vec![Message::new(0, "A", "x")];
    let filter = FilterConfig::new().with_excluded(99);
    assert_eq!(apply_filters(&messages, &filter).len(), 1);
}
