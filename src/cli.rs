//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - CLI argument structure (for use with clap)
//! - [`CliFormat`] - the `--format` values, mapped onto [`ExportFormat`]
//!
//! Flags build a [`FilterConfig`] through its builders, so invalid dates or
//! times surface as the same errors a library caller would get:
//!
//! ```rust
//! use clap::Parser;
//! use chrono::FixedOffset;
//! use sessionlog::cli::Args;
//!
//! let args = Args::parse_from(["sessionlog", "log.json", "--search", "dragon", "--exclude", "3"]);
//! let filter = args.filter_config(FixedOffset::east_opt(0).unwrap()).unwrap();
//! assert_eq!(filter.search_text, "dragon");
//! assert!(filter.excluded_indices.contains(&3));
//! ```

use chrono::FixedOffset;
use clap::{Parser, ValueEnum};

use crate::core::filter::FilterConfig;
use crate::error::Result;
use crate::format::ExportFormat;

/// Render tabletop session chat logs into standalone HTML documents.
#[derive(Parser, Debug, Clone)]
#[command(name = "sessionlog")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    sessionlog session.json
    sessionlog session.json -o night1.html --embed-images
    sessionlog session.json --settings theme.json --after 2024-06-01
    sessionlog session.json --format clipboard -o fragment.html
    sessionlog session.json --preview --exclude 4 --exclude 9")]
pub struct Args {
    /// Path to the session log (JSON)
    pub input: String,

    /// Path to output file (defaults to a name derived from the title)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Settings file with render and export options (JSON)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<String>,

    /// Output format (overrides the settings file)
    #[arg(short, long, value_enum)]
    pub format: Option<CliFormat>,

    /// Inline remote images as data URLs
    #[arg(long)]
    pub embed_images: bool,

    /// Write the preview variant instead of an export
    #[arg(long, conflicts_with_all = ["format", "embed_images"])]
    pub preview: bool,

    /// Keep messages on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,

    /// Keep messages on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,

    /// Start time on the first day (HH:MM)
    #[arg(long, value_name = "HH:MM")]
    pub time_from: Option<String>,

    /// End time on the last day (HH:MM)
    #[arg(long, value_name = "HH:MM")]
    pub time_to: Option<String>,

    /// Keep messages whose text contains this (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Exclude the message at this index (repeatable)
    #[arg(long, value_name = "N")]
    pub exclude: Vec<usize>,

    /// Hide a channel by key (repeatable)
    #[arg(long, value_name = "KEY")]
    pub disable_channel: Vec<String>,

    /// Display offset from UTC in minutes (overrides the settings file)
    #[arg(long, value_name = "MINUTES", allow_hyphen_values = true)]
    pub utc_offset: Option<i32>,

    /// Document title (overrides the log and settings file)
    #[arg(long)]
    pub title: Option<String>,
}

impl Args {
    /// Builds the filter snapshot described by the flags.
    ///
    /// `offset` is the zone the date and time bounds are read in.
    ///
    /// # Errors
    ///
    /// Returns an invalid date or time error for malformed bounds.
    pub fn filter_config(&self, offset: FixedOffset) -> Result<FilterConfig> {
        let mut config = FilterConfig::new().with_utc_offset(offset);

        if let Some(ref after) = self.after {
            config = config.with_date_from(after)?;
        }
        if let Some(ref before) = self.before {
            config = config.with_date_to(before)?;
        }
        if let Some(ref from) = self.time_from {
            config = config.with_time_from(from)?;
        }
        if let Some(ref to) = self.time_to {
            config = config.with_time_to(to)?;
        }
        if let Some(ref search) = self.search {
            config = config.with_search(search.clone());
        }
        for &index in &self.exclude {
            config = config.with_excluded(index);
        }
        for key in &self.disable_channel {
            config = config.with_channel_enabled(key.clone(), false);
        }

        Ok(config)
    }
}

/// Values accepted by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default)]
pub enum CliFormat {
    /// Complete standalone HTML document
    #[default]
    #[value(alias = "html")]
    Document,

    /// Style block and body interior for pasting
    #[value(alias = "fragment")]
    Clipboard,
}

impl std::fmt::Display for CliFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ExportFormat::from(*self))
    }
}

impl From<CliFormat> for ExportFormat {
    fn from(format: CliFormat) -> ExportFormat {
        match format {
            CliFormat::Document => ExportFormat::Document,
            CliFormat::Clipboard => ExportFormat::ClipboardFragment,
        }
    }
}
