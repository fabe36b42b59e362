//! Command-line interface for voxpick
//!
//! Provides argument parsing using clap derive macros.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Voice-command ingest for live transcription streams
#[derive(Parser, Debug)]
#[command(
    name = "voxpick",
    version,
    about = "Voice-command ingest for live transcription streams"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// TCP port the transcription producer connects to
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// Debounce window between accepted commands. Examples: 500ms, 1s, 2s
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub debounce: Option<u64>,

    /// Grace delay after an announcement before ingestion resumes
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub grace: Option<u64>,

    /// Suppress output (quiet mode)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (-v: accepted commands, -vv: per-frame gating)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration string into milliseconds.
///
/// Supports any format accepted by `humantime`: `500ms`, `1s`, `1m30s`.
fn parse_duration_ms(s: &str) -> Result<u64, String> {
    humantime::parse_duration(s)
        .map(|d: Duration| d.as_millis() as u64)
        .map_err(|e| format!("invalid duration '{}': {}", s, e))
}
