//! Row-to-HTML rendering.
//!
//! Converts the rows produced by [`group_rows`](crate::core::grouping::group_rows)
//! into markup. All user content is escaped; sender colors are only emitted
//! when they look like a `#hex` value or a plain color name.

use std::fmt::{self, Write};

use chrono::FixedOffset;

use crate::Message;
use crate::core::clash::{ClashBlock, Combatant, FALLBACK_COLOR, WinnerSide};
use crate::core::grouping::Row;
use crate::core::patterns::is_system_message;

/// Whether rows are rendered for the final document or the live preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Final artifact.
    #[default]
    Document,
    /// Live preview: rows carry `data-index` and the tail posts click events.
    Preview,
}

/// Parameters shared by every row of one render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub display_offset: FixedOffset,
    pub mode: RenderMode,
}

impl RenderContext {
    pub fn new(display_offset: FixedOffset, mode: RenderMode) -> Self {
        Self {
            display_offset,
            mode,
        }
    }

    fn index_attr(&self, msg: &Message) -> String {
        match self.mode {
            RenderMode::Preview => format!(" data-index=\"{}\"", msg.index),
            RenderMode::Document => String::new(),
        }
    }

    fn time_of(&self, msg: &Message) -> Option<String> {
        msg.created_at()
            .map(|ts| ts.with_timezone(&self.display_offset).format("%H:%M").to_string())
    }
}

/// Escapes text for use in element content and quoted attributes.
///
/// ```rust
/// use sessionlog::core::output::html::html_escape;
///
/// assert_eq!(html_escape("<b>\"hi\" & 'bye'</b>"), "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;");
/// ```
pub fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Normalizes blank lines in a message text.
///
/// Leading and trailing blank lines are removed, and runs of three or more
/// blank lines collapse to a single one.
///
/// ```rust
/// use sessionlog::core::output::html::clean_text;
///
/// assert_eq!(clean_text("\n\nhello\n\n\n\nworld\n"), "hello\n\nworld");
/// assert_eq!(clean_text("a\n\nb"), "a\n\nb");
/// ```
pub fn clean_text(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let is_blank = |line: &&str| line.trim().is_empty();

    let Some(first) = lines.iter().position(|l| !is_blank(l)) else {
        return String::new();
    };
    let last = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(first);

    let mut kept: Vec<&str> = Vec::with_capacity(last - first + 1);
    let mut blank_run: Vec<&str> = Vec::new();
    for &line in &lines[first..=last] {
        if is_blank(&line) {
            blank_run.push(line);
            continue;
        }
        if blank_run.len() >= 3 {
            kept.push("");
        } else {
            kept.append(&mut blank_run);
        }
        blank_run.clear();
        kept.push(line);
    }
    kept.join("\n")
}

/// Returns `value` if it is a safe CSS color, otherwise `fallback`.
///
/// Accepted: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, or an ASCII
/// alphanumeric color name.
pub fn safe_color<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return fallback;
    };
    let valid = match value.strip_prefix('#') {
        Some(hex) => {
            matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => value.chars().all(|c| c.is_ascii_alphanumeric()),
    };
    if valid { value } else { fallback }
}

fn text_html(text: &str) -> String {
    html_escape(&clean_text(text)).replace('\n', "<br>")
}

/// Writes the content of one message: text, attached image, dice badge and,
/// for ordinary messages, the whisper badge.
fn write_content(out: &mut String, msg: &Message) -> fmt::Result {
    if let Some(text) = msg.text().map(text_html).filter(|t| !t.is_empty()) {
        write!(out, "<div class=\"text\">{text}</div>")?;
    }
    if let Some(image) = msg.distinct_image() {
        write!(
            out,
            "<img class=\"attachment\" src=\"{}\" alt=\"\" loading=\"lazy\">",
            html_escape(image)
        )?;
    }
    if let Some(dice) = msg.dice_result().filter(|d| !d.trim().is_empty()) {
        write!(out, "<span class=\"dice\">{}</span>", html_escape(dice))?;
    }
    if !is_system_message(msg) {
        if let Some(label) = msg.whisper_label() {
            write!(out, "<span class=\"whisper\">&rarr; {}</span>", html_escape(label))?;
        }
    }
    Ok(())
}

fn write_avatar(out: &mut String, name: &str, color: &str, icon_ref: Option<&str>) -> fmt::Result {
    match icon_ref.filter(|r| !r.is_empty()) {
        Some(icon) => write!(
            out,
            "<img class=\"avatar\" src=\"{}\" alt=\"\">",
            html_escape(icon)
        ),
        None => {
            let initial = name.chars().next().map(String::from).unwrap_or_default();
            write!(
                out,
                "<span class=\"avatar initial\" style=\"background:{color}\">{}</span>",
                html_escape(&initial)
            )
        }
    }
}

fn write_cluster_head(out: &mut String, msg: &Message, ctx: &RenderContext) -> fmt::Result {
    let color = safe_color(msg.sender_color.as_deref(), FALLBACK_COLOR);
    out.push_str("<div class=\"cluster-head\">");
    write_avatar(out, msg.sender_name(), color, msg.icon_ref.as_deref())?;
    write!(
        out,
        "<span class=\"sender\" style=\"color:{color}\">{}</span>",
        html_escape(msg.sender_name())
    )?;
    if let Some(time) = ctx.time_of(msg) {
        write!(out, "<time>{time}</time>")?;
    }
    out.push_str("</div>");
    Ok(())
}

fn write_message_row(out: &mut String, msg: &Message, ctx: &RenderContext) -> fmt::Result {
    write!(out, "<div class=\"msg\"{}>", ctx.index_attr(msg))?;
    write_content(out, msg)?;
    out.push_str("</div>\n");
    Ok(())
}

fn write_combatant(out: &mut String, combatant: &Combatant) -> fmt::Result {
    let color = safe_color(Some(combatant.color.as_str()), FALLBACK_COLOR);
    write!(
        out,
        "<span class=\"combatant\" style=\"color:{color}\">{}</span>",
        html_escape(&combatant.name)
    )
}

fn write_clash(
    out: &mut String,
    block: &ClashBlock,
    messages: &[&Message],
    ctx: &RenderContext,
) -> fmt::Result {
    out.push_str("<details class=\"clash\"><summary>");
    write_combatant(out, &block.attacker)?;
    out.push_str(" <span class=\"versus\">vs</span> ");
    write_combatant(out, &block.defender)?;
    let plural = if block.rounds == 1 { "" } else { "s" };
    write!(out, " <span class=\"rounds\">{} round{plural}</span>", block.rounds)?;
    match (block.winner_side, block.winner()) {
        (WinnerSide::Draw, _) | (_, None) => {
            out.push_str(" <span class=\"result draw\">Draw</span>");
        }
        (_, Some(winner)) => {
            write!(
                out,
                " <span class=\"result\">Winner: {}</span>",
                html_escape(&winner.name)
            )?;
            if let Some(dice) = &block.winner_dice_text {
                write!(out, " <span class=\"dice\">{}</span>", html_escape(dice))?;
            }
        }
    }
    out.push_str("</summary><div class=\"clash-body\">\n");

    for msg in messages {
        let color = safe_color(msg.sender_color.as_deref(), FALLBACK_COLOR);
        write!(
            out,
            "<div class=\"clash-line\"{}><span class=\"sender\" style=\"color:{color}\">{}</span>",
            ctx.index_attr(msg),
            html_escape(msg.sender_name())
        )?;
        write_content(out, msg)?;
        out.push_str("</div>\n");
    }
    out.push_str("</div></details>\n");
    Ok(())
}

/// Appends the markup of one row to `out`.
pub fn render_row(out: &mut String, row: &Row<'_>, ctx: &RenderContext) -> fmt::Result {
    match row {
        Row::DateSeparator(date) => writeln!(
            out,
            "<div class=\"date-separator\"><span>{}</span></div>",
            date.format("%Y-%m-%d (%a)")
        ),
        Row::ChannelHeader { name, alt } => writeln!(
            out,
            "<div class=\"channel-header{}\">#{}</div>",
            if *alt { " alt" } else { "" },
            html_escape(name)
        ),
        Row::OpenAltSection => writeln!(out, "<section class=\"alt-section\">"),
        Row::CloseAltSection => writeln!(out, "</section>"),
        Row::System(messages) => {
            out.push_str("<div class=\"system-block\">\n");
            for msg in messages {
                write!(out, "<div class=\"system-line\"{}>", ctx.index_attr(msg))?;
                if let Some(time) = ctx.time_of(msg) {
                    write!(out, "<time>{time}</time>")?;
                }
                write_content(out, msg)?;
                out.push_str("</div>\n");
            }
            out.push_str("</div>\n");
            Ok(())
        }
        Row::OpenCluster(msg) => {
            out.push_str("<div class=\"cluster\">");
            write_cluster_head(out, msg, ctx)?;
            write_message_row(out, msg, ctx)
        }
        Row::ClusterRow(msg) => write_message_row(out, msg, ctx),
        Row::CloseCluster => writeln!(out, "</div>"),
        Row::Divider => writeln!(out, "<hr class=\"divider\">"),
        Row::Clash { block, messages } => write_clash(out, block, messages, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clash::detect_clashes;
    use crate::message::MessageKind;
    use chrono::{TimeZone, Utc};

    fn ctx(mode: RenderMode) -> RenderContext {
        RenderContext::new(FixedOffset::east_opt(0).unwrap(), mode)
    }

    fn render(row: &Row<'_>, mode: RenderMode) -> String {
        let mut out = String::new();
        render_row(&mut out, row, &ctx(mode)).unwrap();
        out
    }

    // =========================================================================
    // Text helpers
    // =========================================================================

    #[test]
    fn test_clean_text_trims_and_collapses() {
        assert_eq!(clean_text("\n \nline\n"), "line");
        assert_eq!(clean_text("a\n\n\nb"), "a\n\n\nb");
        assert_eq!(clean_text("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_text("a\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
        assert_eq!(clean_text("   \n  "), "");
    }

    #[test]
    fn test_safe_color() {
        assert_eq!(safe_color(Some("#ff8800"), FALLBACK_COLOR), "#ff8800");
        assert_eq!(safe_color(Some("#abc"), FALLBACK_COLOR), "#abc");
        assert_eq!(safe_color(Some("crimson"), FALLBACK_COLOR), "crimson");
        assert_eq!(safe_color(Some("red;background:url(x)"), FALLBACK_COLOR), FALLBACK_COLOR);
        assert_eq!(safe_color(Some("#12345"), FALLBACK_COLOR), FALLBACK_COLOR);
        assert_eq!(safe_color(None, FALLBACK_COLOR), FALLBACK_COLOR);
    }

    // =========================================================================
    // Rows
    // =========================================================================

    #[test]
    fn test_cluster_head_and_content() {
        let msg = Message::new(7, "Alice", "Hello <world>\nbye")
            .with_color("#ff0000")
            .with_dice("2D6 > 9")
            .with_created_at(Utc.with_ymd_and_hms(2024, 6, 15, 9, 5, 0).unwrap());
        let html = render(&Row::OpenCluster(&msg), RenderMode::Document);

        assert!(html.contains("style=\"color:#ff0000\">Alice</span>"));
        assert!(html.contains("<time>09:05</time>"));
        assert!(html.contains("Hello &lt;world&gt;<br>bye"));
        assert!(html.contains("<span class=\"dice\">2D6 &gt; 9</span>"));
        assert!(html.contains("avatar initial"));
        assert!(!html.contains("data-index"));
    }

    #[test]
    fn test_preview_rows_carry_index() {
        let msg = Message::new(42, "Alice", "hi");
        let html = render(&Row::ClusterRow(&msg), RenderMode::Preview);
        assert!(html.contains("data-index=\"42\""));
    }

    #[test]
    fn test_avatar_image_and_distinct_attachment() {
        let msg = Message::new(0, "Alice", "")
            .with_icon("https://img/a.png")
            .with_image("https://img/a.png");
        let html = render(&Row::OpenCluster(&msg), RenderMode::Document);
        assert!(html.contains("class=\"avatar\" src=\"https://img/a.png\""));
        assert!(!html.contains("attachment"));

        let msg = msg.with_image("https://img/b.png");
        let html = render(&Row::ClusterRow(&msg), RenderMode::Document);
        assert!(html.contains("class=\"attachment\" src=\"https://img/b.png\""));
    }

    #[test]
    fn test_whisper_badge_only_for_normal_messages() {
        let whisper = Message::new(0, "Alice", "psst").with_whisper("u1", "Bob");
        let html = render(&Row::ClusterRow(&whisper), RenderMode::Document);
        assert!(html.contains("<span class=\"whisper\">&rarr; Bob</span>"));

        let system = whisper.with_kind(MessageKind::System);
        let html = render(&Row::System(vec![&system]), RenderMode::Document);
        assert!(!html.contains("whisper"));
    }

    #[test]
    fn test_invalid_color_falls_back() {
        let msg = Message::new(0, "Eve", "x").with_color("red\" onclick=\"alert(1)");
        let html = render(&Row::OpenCluster(&msg), RenderMode::Document);
        assert!(html.contains("color:#d0d0d0"));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn test_channel_header_escapes_name() {
        let html = render(
            &Row::ChannelHeader {
                name: "<b>side</b>",
                alt: true,
            },
            RenderMode::Document,
        );
        assert!(html.contains("channel-header alt"));
        assert!(html.contains("#&lt;b&gt;side&lt;/b&gt;"));
    }

    #[test]
    fn test_clash_renders_details() {
        let messages = vec![
            Message::new(0, "GM", "Clash start: [Alice] vs [Bob]"),
            Message::new(1, "Alice", "Round 1").with_dice("1D6 > 6"),
            Message::new(2, "GM", "Clash end: [Alice] wins"),
        ];
        let refs: Vec<&Message> = messages.iter().collect();
        let clashes = detect_clashes(&refs);
        let row = Row::Clash {
            block: &clashes.blocks[0],
            messages: refs.clone(),
        };
        let html = render(&row, RenderMode::Preview);

        assert!(html.starts_with("<details class=\"clash\">"));
        assert!(html.contains("1 round</span>"));
        assert!(html.contains("Winner: Alice"));
        assert_eq!(html.matches("class=\"clash-line\"").count(), 3);
        assert!(html.contains("data-index=\"2\""));
    }
}
