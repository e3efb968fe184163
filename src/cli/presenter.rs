//! CLI presenter for output formatting

use chrono::{Local, NaiveDate};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::entry::Entry;
use crate::domain::recording::format_elapsed;

/// Characters of entry text shown in one-line listings
const PREVIEW_CHARS: usize = 60;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Recording clock against the auto-stop limit
    pub fn update_recording_progress(&self, elapsed_secs: u64, max_secs: u64) {
        self.update_spinner(&format!(
            "Recording... {}  (Enter to stop)",
            progress_bar(elapsed_secs, max_secs)
        ));
    }

    /// Print capture host status
    pub fn capture_status(&self, state: &str) {
        eprintln!("{} Capture: {}", "●".cyan(), state);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// One-line listing of an entry: short id, local time, photo count, preview
    pub fn entry_line(&self, entry: &Entry) {
        println!("{}", format_entry_line(entry));
    }

    /// Full entry: header, text and attachment paths
    pub fn entry_detail(&self, entry: &Entry) {
        let local = entry.timestamp.with_timezone(&Local);
        println!("{} {}", "id:".cyan(), entry.id);
        println!("{} {}", "time:".cyan(), local.format("%Y-%m-%d %H:%M:%S"));
        println!("{} {}", "status:".cyan(), entry.status());
        if let Some(deleted_at) = entry.deleted_at {
            println!(
                "{} {}",
                "trashed:".cyan(),
                deleted_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
        for image in &entry.images {
            println!("{} {} ({})", "photo:".cyan(), image.original_path, image.thumb_path);
        }
        if !entry.text.is_empty() {
            println!();
            println!("{}", entry.text);
        }
    }

    /// Day heading for listings
    pub fn day_heading(&self, day: NaiveDate, count: usize) {
        eprintln!(
            "{} {} ({} {})",
            "■".cyan(),
            day.format("%Y-%m-%d %a"),
            count,
            if count == 1 { "entry" } else { "entries" }
        );
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

const BAR_WIDTH: u64 = 20;

/// `[████░░...] m:ss / m:ss`
fn progress_bar(elapsed_secs: u64, max_secs: u64) -> String {
    let filled = match max_secs {
        0 => 0,
        max => (elapsed_secs.min(max) * BAR_WIDTH / max) as usize,
    };
    format!(
        "[{}{}] {} / {}",
        "█".repeat(filled).cyan(),
        "░".repeat(BAR_WIDTH as usize - filled),
        format_elapsed(elapsed_secs),
        format_elapsed(max_secs)
    )
}

fn format_entry_line(entry: &Entry) -> String {
    let local = entry.timestamp.with_timezone(&Local);
    let photos = match entry.images.len() {
        0 => String::new(),
        n => format!(" [{} photo{}]", n, if n == 1 { "" } else { "s" }),
    };
    format!(
        "{}  {}{}  {}",
        entry.id.short(),
        local.format("%H:%M"),
        photos,
        entry.preview(PREVIEW_CHARS)
    )
}
