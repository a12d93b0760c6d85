//! Document stylesheet.

use crate::config::{Palette, RenderSettings};
use crate::core::output::html::safe_color;

/// Resolved color values, with every slot validated against the default
/// palette.
struct Colors<'a> {
    background: &'a str,
    panel: &'a str,
    log_area: &'a str,
    card: &'a str,
    text: &'a str,
    text_subtle: &'a str,
    text_dim: &'a str,
    system_bg: &'a str,
    system_text: &'a str,
    section_bg: &'a str,
    section_text: &'a str,
}

fn pick<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    safe_color(Some(value), fallback)
}

impl<'a> Colors<'a> {
    fn resolve(palette: &'a Palette, defaults: &'a Palette) -> Self {
        Self {
            background: pick(&palette.background, &defaults.background),
            panel: pick(&palette.panel, &defaults.panel),
            log_area: pick(&palette.log_area, &defaults.log_area),
            card: pick(&palette.card, &defaults.card),
            text: pick(&palette.text, &defaults.text),
            text_subtle: pick(&palette.text_subtle, &defaults.text_subtle),
            text_dim: pick(&palette.text_dim, &defaults.text_dim),
            system_bg: pick(&palette.system_bg, &defaults.system_bg),
            system_text: pick(&palette.system_text, &defaults.system_text),
            section_bg: pick(&palette.secondary_section_bg, &defaults.secondary_section_bg),
            section_text: pick(&palette.secondary_section_text, &defaults.secondary_section_text),
        }
    }
}

/// Strips characters that could end the `font-family` declaration.
fn font_family(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '\\'))
        .collect();
    if cleaned.trim().is_empty() {
        "sans-serif".to_string()
    } else {
        cleaned
    }
}

/// Builds the content of the document's `<style>` element.
///
/// ```rust
/// use sessionlog::config::{DividerWeight, RenderSettings};
/// use sessionlog::core::output::style::stylesheet;
///
/// let css = stylesheet(&RenderSettings::new().with_divider_weight(DividerWeight::Thin));
/// assert!(css.contains("border-top: 1px solid"));
/// ```
pub fn stylesheet(settings: &RenderSettings) -> String {
    let defaults = Palette::default();
    let c = Colors::resolve(&settings.palette, &defaults);
    let font = font_family(&settings.font_family);
    let divider = settings.divider_weight.css_width();

    let mut css = format!(
        r"
body {{ margin: 0; background: {bg}; color: {text}; font-family: {font}; line-height: 1.6; }}
.page {{ max-width: 860px; margin: 0 auto; padding: 24px 16px; }}
.page-header {{ background: {panel}; border-radius: 8px; padding: 16px 20px; margin-bottom: 16px; }}
.page-header h1 {{ margin: 0; font-size: 1.4em; }}
.header-image {{ display: block; width: 100%; border-radius: 8px; margin-bottom: 16px; }}
.log {{ background: {log_area}; border-radius: 8px; padding: 12px; }}
.date-separator {{ text-align: center; margin: 20px 0 12px; color: {dim}; font-size: 0.85em; }}
.date-separator span {{ padding: 2px 12px; border-radius: 12px; background: {panel}; }}
.channel-header {{ color: {subtle}; font-weight: bold; font-size: 0.85em; margin: 12px 4px 6px; }}
.alt-section {{ background: {section_bg}; color: {section_text}; border-radius: 6px; padding: 6px 10px; margin: 8px 0; }}
.channel-header.alt {{ color: {section_text}; }}
.cluster {{ background: {card}; border-radius: 6px; padding: 8px 12px; margin: 6px 0; }}
.alt-section .cluster {{ background: transparent; }}
.cluster-head {{ display: flex; align-items: center; gap: 8px; margin-bottom: 2px; }}
.avatar {{ width: 36px; height: 36px; border-radius: 50%; object-fit: cover; flex-shrink: 0; }}
.avatar.initial {{ display: inline-flex; align-items: center; justify-content: center; color: #ffffff; font-weight: bold; }}
.sender {{ font-weight: bold; }}
time {{ color: {dim}; font-size: 0.8em; margin-left: 6px; }}
.msg {{ padding: 2px 0 2px 44px; }}
.text {{ white-space: normal; overflow-wrap: anywhere; }}
.attachment {{ display: block; max-width: 100%; max-height: 480px; margin: 6px 0; border-radius: 4px; }}
.dice {{ display: inline-block; font-size: 0.85em; padding: 0 8px; margin: 2px 4px 2px 0; border-radius: 10px; background: {system_bg}; color: {system_text}; }}
.whisper {{ display: inline-block; font-size: 0.8em; color: {subtle}; font-style: italic; }}
.divider {{ border: 0; border-top: {divider} solid {system_bg}; margin: 8px 0; }}
.system-block {{ background: {system_bg}; color: {system_text}; border-radius: 6px; padding: 6px 12px; margin: 6px 0; font-size: 0.9em; }}
.clash {{ background: {card}; border-left: 4px solid {subtle}; border-radius: 6px; padding: 6px 12px; margin: 6px 0; }}
.clash summary {{ cursor: pointer; color: {subtle}; }}
.clash .versus, .clash .rounds {{ color: {dim}; font-size: 0.85em; }}
.clash .result {{ font-weight: bold; margin-left: 6px; }}
.clash-line {{ padding: 2px 0; }}
.clash-line .sender {{ margin-right: 6px; }}
.page-footer {{ color: {dim}; font-size: 0.8em; text-align: center; margin-top: 16px; }}
",
        bg = c.background,
        text = c.text,
        font = font,
        panel = c.panel,
        log_area = c.log_area,
        dim = c.text_dim,
        subtle = c.text_subtle,
        section_bg = c.section_bg,
        section_text = c.section_text,
        card = c.card,
        system_bg = c.system_bg,
        system_text = c.system_text,
        divider = divider,
    );

    if settings.halftone_pattern {
        css.push_str(&format!(
            ".log {{ background-image: radial-gradient({} 1px, transparent 1px); background-size: 6px 6px; }}\n",
            c.system_bg
        ));
    }
    css
}
