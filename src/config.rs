//! Render and export settings.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies. Each struct is an immutable
//! snapshot for one export: build it with `new()` and the `with_*`
//! builders, or deserialize it from the settings file (camelCase keys,
//! every field optional).
//!
//! - [`RenderSettings`] - look of the produced document
//! - [`ExportOptions`] - what the export produces and how images are handled
//!
//! # Example
//!
//! ```rust
//! use sessionlog::config::{DividerWeight, RenderSettings};
//!
//! let settings = RenderSettings::new()
//!     .with_title("Friday session")
//!     .with_divider_weight(DividerWeight::Thick)
//!     .with_utc_offset_minutes(540);
//!
//! assert_eq!(settings.display_offset().local_minus_utc(), 540 * 60);
//! ```

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::format::ExportFormat;

/// Named color slots of the document theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Palette {
    /// Page background.
    pub background: String,
    /// Header and footer panels.
    pub panel: String,
    /// Area behind the log rows.
    pub log_area: String,
    /// Message cluster cards.
    pub card: String,
    /// Primary text.
    pub text: String,
    /// Secondary text (channel headers, clash summaries).
    pub text_subtle: String,
    /// Timestamps and footer.
    pub text_dim: String,
    /// System notice background.
    pub system_bg: String,
    /// System notice text.
    pub system_text: String,
    /// Background of non-main channel sections.
    pub secondary_section_bg: String,
    /// Text of non-main channel sections.
    pub secondary_section_text: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: "#f4f1ea".to_string(),
            panel: "#ffffff".to_string(),
            log_area: "#fbfaf7".to_string(),
            card: "#ffffff".to_string(),
            text: "#2b2b2b".to_string(),
            text_subtle: "#5c5c5c".to_string(),
            text_dim: "#8a8a8a".to_string(),
            system_bg: "#eceae4".to_string(),
            system_text: "#6b6b6b".to_string(),
            secondary_section_bg: "#eef3f8".to_string(),
            secondary_section_text: "#34495e".to_string(),
        }
    }
}

/// Thickness of the line between clusters of different senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DividerWeight {
    /// No visible divider.
    None,
    Thin,
    #[default]
    Normal,
    Thick,
}

impl DividerWeight {
    /// Returns the CSS border width for this weight.
    pub fn css_width(self) -> &'static str {
        match self {
            DividerWeight::None => "0",
            DividerWeight::Thin => "1px",
            DividerWeight::Normal => "2px",
            DividerWeight::Thick => "4px",
        }
    }
}

/// Look of the produced document.
///
/// # Example
///
/// ```rust
/// use sessionlog::config::RenderSettings;
///
/// let settings: RenderSettings = serde_json::from_str(r#"{"title":"Raid night"}"#).unwrap();
/// assert_eq!(settings.title, "Raid night");
/// assert!(!settings.halftone_pattern);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Theme colors.
    pub palette: Palette,

    /// CSS `font-family` value.
    pub font_family: String,

    /// Stylesheet linked from the document head (web fonts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_stylesheet_url: Option<String>,

    /// Divider thickness between sender clusters.
    pub divider_weight: DividerWeight,

    /// Dotted background overlay on the log area.
    pub halftone_pattern: bool,

    /// Banner image shown above the log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_image_ref: Option<String>,

    /// Document title, also used for the suggested filename.
    pub title: String,

    /// Offset from UTC, in minutes, used to display timestamps and dates.
    pub utc_offset_minutes: i32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            font_family: "\"Noto Sans JP\", \"Hiragino Sans\", sans-serif".to_string(),
            font_stylesheet_url: None,
            divider_weight: DividerWeight::default(),
            halftone_pattern: false,
            header_image_ref: None,
            title: "Session Log".to_string(),
            utc_offset_minutes: 0,
        }
    }
}

impl RenderSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the palette.
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Sets the font family.
    #[must_use]
    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }

    /// Sets the web font stylesheet URL.
    #[must_use]
    pub fn with_font_stylesheet(mut self, url: impl Into<String>) -> Self {
        self.font_stylesheet_url = Some(url.into());
        self
    }

    /// Sets the divider weight.
    #[must_use]
    pub fn with_divider_weight(mut self, weight: DividerWeight) -> Self {
        self.divider_weight = weight;
        self
    }

    /// Enables or disables the halftone overlay.
    #[must_use]
    pub fn with_halftone(mut self, enabled: bool) -> Self {
        self.halftone_pattern = enabled;
        self
    }

    /// Sets the header banner image.
    #[must_use]
    pub fn with_header_image(mut self, image_ref: impl Into<String>) -> Self {
        self.header_image_ref = Some(image_ref.into());
        self
    }

    /// Sets the document title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the display offset in minutes east of UTC.
    #[must_use]
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Returns the display zone. Out-of-range offsets fall back to UTC.
    pub fn display_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Default number of images fetched concurrently.
pub const DEFAULT_IMAGE_BATCH_SIZE: usize = 6;

/// Default per-image fetch timeout, in seconds.
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 15;

/// What an export produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Inline every referenced image as a data URL.
    pub embed_images: bool,

    /// Output format.
    pub format: ExportFormat,

    /// Images fetched concurrently per batch.
    pub image_batch_size: usize,

    /// Per-image fetch timeout in seconds.
    pub image_timeout_secs: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            embed_images: false,
            format: ExportFormat::default(),
            image_batch_size: DEFAULT_IMAGE_BATCH_SIZE,
            image_timeout_secs: DEFAULT_IMAGE_TIMEOUT_SECS,
        }
    }
}

impl ExportOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables image embedding.
    #[must_use]
    pub fn with_embed_images(mut self, enabled: bool) -> Self {
        self.embed_images = enabled;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the image batch size (at least 1).
    #[must_use]
    pub fn with_image_batch_size(mut self, size: usize) -> Self {
        self.image_batch_size = size.max(1);
        self
    }

    /// Returns `true` when images will actually be fetched.
    ///
    /// Clipboard fragments never embed, whatever `embed_images` says.
    pub fn should_embed(&self) -> bool {
        self.embed_images && self.format.embeds_images()
    }
}
