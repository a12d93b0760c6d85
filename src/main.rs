//! # sessionlog CLI
//!
//! Command-line interface for the sessionlog library.

use std::fs;
use std::process;
use std::time::Instant;

use chrono::FixedOffset;
use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use sessionlog::cli::Args;
use sessionlog::embed::HttpFetcher;
use sessionlog::export::{ExportOutcome, ExportRequest, Exporter, preview};
use sessionlog::format::ExportFormat;
use sessionlog::progress::stderr_progress;
use sessionlog::session::{SettingsFile, load_session};
use sessionlog::{ExportError, Result};

const PREVIEW_OUTPUT: &str = "preview.html";
const FRAGMENT_OUTPUT: &str = "clipboard_fragment.html";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("❌ Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let total_start = Instant::now();
    let args = <Args as ClapParser>::parse();

    let settings = match args.settings {
        Some(ref path) => SettingsFile::load(path)?,
        None => SettingsFile::default(),
    };
    let log = load_session(&args.input)?;

    let mut render = settings.render;
    if let Some(minutes) = args.utc_offset {
        render = render.with_utc_offset_minutes(minutes);
    }
    if let Some(ref title) = args.title {
        render = render.with_title(title.clone());
    } else if let Some(ref title) = log.title {
        render = render.with_title(title.clone());
    }

    let mut options = settings.export;
    if let Some(format) = args.format {
        options = options.with_format(format.into());
    }
    if args.embed_images {
        options = options.with_embed_images(true);
    }

    let offset: FixedOffset = render.display_offset();
    let filter = args.filter_config(offset)?;

    // Print header
    println!("📜 sessionlog v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Input:    {}", args.input);
    println!("🏷️  Title:    {}", render.title);
    if args.preview {
        println!("👁️  Mode:     Preview");
    } else {
        println!("📄 Format:   {}", options.format);
        if options.should_embed() {
            println!("🖼️  Images:   embedded");
        }
    }
    println!("🕒 Offset:   {offset}");
    if let Some(ref after) = args.after {
        println!("📅 After:    {after}");
    }
    if let Some(ref before) = args.before {
        println!("📅 Before:   {before}");
    }
    if let Some(ref search) = args.search {
        println!("🔍 Search:   {search}");
    }
    println!();
    println!("   Loaded {} messages", log.messages.len());

    if args.preview {
        let output_path = args.output.clone().unwrap_or_else(|| PREVIEW_OUTPUT.to_string());
        let Some(chunks) = preview(&log.messages, &filter, &render)? else {
            println!("⚠️  No messages match the current filters, nothing written");
            return Ok(());
        };
        fs::write(&output_path, chunks.concat())?;
        println!();
        println!("✅ Done! Preview saved to {output_path}");
        print_timing(total_start);
        return Ok(());
    }

    let fetcher = if options.should_embed() {
        Some(HttpFetcher::new()?)
    } else {
        None
    };
    let mut exporter = Exporter::new().with_progress(stderr_progress());
    if let Some(ref fetcher) = fetcher {
        exporter = exporter.with_fetcher(fetcher);
    }

    let request = ExportRequest::new(filter, render, options);
    let output_path = match exporter.export(&log.messages, &request).await? {
        ExportOutcome::Document { chunks, filename } => {
            let path = args.output.clone().unwrap_or(filename);
            write_chunks(&path, &chunks)?;
            path
        }
        ExportOutcome::Clipboard(fragment) => {
            let path = args.output.clone().unwrap_or_else(|| FRAGMENT_OUTPUT.to_string());
            fs::write(&path, fragment.to_html())?;
            path
        }
        ExportOutcome::Empty => {
            println!("⚠️  No messages match the current filters, nothing written");
            return Ok(());
        }
    };

    println!();
    match request.options.format {
        ExportFormat::ClipboardFragment => println!("✅ Done! Fragment saved to {output_path}"),
        _ => println!("✅ Done! Document saved to {output_path}"),
    }
    print_timing(total_start);

    Ok(())
}

/// Writes document chunks in order without joining them first.
fn write_chunks(path: &str, chunks: &[String]) -> Result<()> {
    use std::io::Write;

    let file = fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    for chunk in chunks {
        writer.write_all(chunk.as_bytes())?;
    }
    writer.flush().map_err(ExportError::from)
}

fn print_timing(start: Instant) {
    println!();
    println!("⚡ Total time: {:.2}s", start.elapsed().as_secs_f64());
}
