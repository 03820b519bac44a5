//! nested-split: fan nested JSON arrays out into one record per element
//!
//! Usage:
//!   # Split the default "events" array of a single document into "message"s
//!   nested-split data.json
//!
//!   # Read NDJSON from stdin, split body.events into "event"
//!   cat events.jsonl | nested-split --ndjson --keys body,events --target event
//!
//!   # Load options from a JSON config file and write to a file
//!   nested-split --config split.json --output split.jsonl input.json

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use nested_split::{split_document, split_json, JsonSplitter, RecordWriter, SplitConfig};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nested-split")]
#[command(about = "Split a nested JSON array into one record per element", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// JSON config file with "keys" and "target"
    #[arg(long, short = 'c')]
    config: Option<String>,

    /// Comma-separated path of keys leading to the array (default: events)
    #[arg(long, short = 'k')]
    keys: Option<String>,

    /// Field that receives each element (default: message)
    #[arg(long, short = 't')]
    target: Option<String>,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Log level filter; overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Build config: file first, then flags on top
    let mut config = match &args.config {
        Some(path) => SplitConfig::from_file(path)?,
        None => SplitConfig::default(),
    };
    if let Some(keys) = &args.keys {
        config.keys = keys.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Some(target) = args.target {
        config.target = target;
    }

    let splitter = JsonSplitter::new(config).context("Invalid split configuration")?;
    tracing::debug!(
        keys = ?splitter.config().keys,
        target_field = %splitter.config().target,
        "Splitter configured"
    );

    let reader = if let Some(path) = &args.input {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
        Box::new(file) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };
    let output = if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
        Box::new(file) as Box<dyn Write>
    } else {
        Box::new(std::io::stdout()) as Box<dyn Write>
    };
    let mut writer = RecordWriter::new(BufWriter::new(output));

    let stats = if args.ndjson {
        split_json(BufReader::new(reader), &mut writer, &splitter)?
    } else {
        split_document(reader, &mut writer, &splitter)?
    };

    tracing::info!(
        records_in = stats.records_in,
        records_out = stats.records_out,
        aborted = stats.aborted,
        null_events = stats.null_events,
        empty_events = stats.empty_events,
        skipped_elements = stats.skipped_elements,
        "Splitting finished"
    );

    Ok(())
}
