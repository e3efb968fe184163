//! CLI argument definitions using Clap

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// VoiceLog - a voice and photo journal
#[derive(Parser, Debug)]
#[command(name = "voicelog")]
#[command(version)]
#[command(about = "Daily journal with voice dictation and photos")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory holding entries.json and media/ (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a new entry from text and/or photos
    Add {
        /// Entry text
        text: Option<String>,

        /// Day to file the entry under (YYYY-MM-DD), at the current time of day
        #[arg(long, value_name = "DATE")]
        day: Option<NaiveDate>,

        /// Photo to attach (repeatable)
        #[arg(short = 'i', long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// List active entries for a day (default: today)
    List {
        /// Day to list (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        day: Option<NaiveDate>,
    },
    /// List the days that have entries
    Days {
        /// Only days in this month (YYYY-MM)
        #[arg(long, value_name = "MONTH", value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// Show one entry in full
    Show {
        /// Entry id or unique id prefix
        id: String,
    },
    /// Move entries to the trash
    Delete {
        /// Entry ids or unique id prefixes
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Inspect, restore or purge trashed entries
    Trash {
        #[command(subcommand)]
        action: TrashAction,
    },
    /// Dictate an entry in the foreground (Enter or Ctrl-C stops)
    Record {
        /// Day to file the entry under (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        day: Option<NaiveDate>,

        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Run the capture host for shortcut commands
    Daemon {
        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Control a running capture host
    Capture {
        #[command(subcommand)]
        action: CaptureAction,
    },
    /// Remove media files that no entry references
    Gc,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by the capture commands
#[derive(Args, Debug, Clone, Default)]
pub struct CaptureArgs {
    /// Dictation language tag (e.g., ja-JP, en-US)
    #[arg(short = 'l', long, value_name = "TAG")]
    pub language: Option<String>,

    /// Stop recording automatically after this long (e.g., 90s, 5m)
    #[arg(long, value_name = "TIME")]
    pub max_duration: Option<String>,
}

/// Trash actions
#[derive(Subcommand, Debug)]
pub enum TrashAction {
    /// List trashed entries, most recently trashed first
    List,
    /// Put entries back into the journal
    Restore(Selection),
    /// Delete entries and their photos for good
    Purge(Selection),
}

/// A set of trashed entries picked on the command line
#[derive(Args, Debug, Clone)]
pub struct Selection {
    /// Entry ids or unique id prefixes
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub ids: Vec<String>,

    /// Act on everything in the trash
    #[arg(long)]
    pub all: bool,
}

/// Capture host control actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAction {
    /// Start recording
    Start,
    /// Stop recording and transcribe
    Stop,
    /// Discard the recording or the pending transcription
    Cancel,
    /// Show the capture state
    Status,
}

impl CaptureAction {
    /// Wire command sent to the capture host
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Cancel => "cancel",
            Self::Status => "status",
        }
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["api_key", "language", "model", "data_dir", "max_duration"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

/// Parse `YYYY-MM` into the first day of that month
fn parse_month(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM, got '{}'", value))
}
