//! Benchmarks for sessionlog filtering, grouping and rendering.
//!
//! Run with: `cargo bench`
//! Run specific group: `cargo bench --bench rendering -- assemble`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use sessionlog::Message;
use sessionlog::config::RenderSettings;
use sessionlog::core::output::{RenderMode, assemble};
use sessionlog::core::{FilterConfig, GroupingSettings, apply_filters, detect_clashes, group_rows};

use chrono::{TimeDelta, TimeZone, Utc};

// =============================================================================
// Test Data Generators
// =============================================================================

/// A session with a clash every 50 messages, a side channel and system notices.
fn generate_session(count: usize) -> Vec<Message> {
    let start = Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let at = start + TimeDelta::seconds(i as i64 * 40);
            let msg = match i % 50 {
                10 => Message::new(i, "GM", "Clash start: [Alice] vs [Bob]"),
                11 | 12 => {
                    Message::new(i, "Alice", format!("Round {}", i % 50 - 10)).with_dice("2D6 > 8")
                }
                13 => Message::new(i, "GM", "Clash end: [Alice] wins"),
                25 => Message::system(i, "Carol joined the table"),
                30..=34 => Message::new(i, "Bob", "side chatter").with_channel("ooc", "Table talk"),
                _ => {
                    let sender = if i % 3 == 0 { "Alice" } else { "Bob" };
                    Message::new(i, sender, format!("Message number {i}\nwith a second line"))
                        .with_color("#3366cc")
                }
            };
            msg.with_created_at(at)
        })
        .collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    for size in [1_000, 10_000] {
        let messages = generate_session(size);
        let filter = FilterConfig::new()
            .with_search("number")
            .with_channel_enabled("ooc", false)
            .with_excluded(5);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &messages, |b, messages| {
            b.iter(|| apply_filters(black_box(messages), black_box(&filter)));
        });
    }
    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");
    for size in [1_000, 10_000] {
        let messages = generate_session(size);
        let refs: Vec<&Message> = messages.iter().collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &refs, |b, refs| {
            b.iter(|| {
                let clashes = detect_clashes(black_box(refs));
                group_rows(refs, &clashes, &GroupingSettings::default()).len()
            });
        });
    }
    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    let settings = RenderSettings::default();
    for size in [1_000, 10_000] {
        let messages = generate_session(size);
        let refs: Vec<&Message> = messages.iter().collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("document", size), &refs, |b, refs| {
            b.iter(|| assemble(black_box(refs), &settings, RenderMode::Document));
        });
        group.bench_with_input(BenchmarkId::new("preview", size), &refs, |b, refs| {
            b.iter(|| assemble(black_box(refs), &settings, RenderMode::Preview));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_filter, bench_grouping, bench_assemble);
criterion_main!(benches);
