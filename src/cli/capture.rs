//! Capture wiring shared by the foreground recorder and the capture host

use chrono::{Local, NaiveDate, Utc};

use crate::application::{CaptureSession, EntryComposer};
use crate::domain::capture::CaptureState;
use crate::domain::config::AppConfig;
use crate::domain::entry::{anchor_to_day, Entry};
use crate::domain::recording::{format_elapsed, Duration};
use crate::domain::transcription::{Language, SystemPrompt};
use crate::infrastructure::{CpalRecorder, GeminiTranscriber};

use super::app::{report_saved, require_api_key, CommandError, Journal};
use super::presenter::Presenter;

/// The session type the command line drives
pub type Session = CaptureSession<CpalRecorder, GeminiTranscriber>;

/// Validated capture settings from the merged config
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub api_key: String,
    pub language: Language,
    pub model: String,
    pub max_duration: Duration,
}

impl CaptureSettings {
    /// Check the capture-related config values. A malformed language or
    /// duration is a usage error; a missing API key is a plain failure.
    pub fn from_config(config: &AppConfig) -> Result<Self, CommandError> {
        let language = match config.language.as_deref() {
            Some(tag) => tag
                .parse::<Language>()
                .map_err(|e| CommandError::Usage(e.to_string()))?,
            None => Language::default(),
        };
        let max_duration = match config.max_duration.as_deref() {
            Some(value) => value
                .parse::<Duration>()
                .map_err(|e| CommandError::Usage(format!("Invalid max-duration: {}", e)))?,
            None => Duration::default_max_duration(),
        };

        Ok(Self {
            api_key: require_api_key(config)?,
            language,
            model: config.model_or_default().to_string(),
            max_duration,
        })
    }

    /// Build an idle session on the default microphone
    pub fn session(&self) -> Session {
        let transcriber = GeminiTranscriber::new(self.api_key.clone()).with_model(self.model.clone());
        CaptureSession::new(
            CpalRecorder::new(),
            transcriber,
            SystemPrompt::build(&self.language),
        )
    }
}

/// Store a finished transcript as a new entry.
///
/// With `day`, the entry is anchored to that day at the current time of
/// day; otherwise it is filed at the current instant.
pub async fn save_transcript(
    journal: &Journal,
    presenter: &Presenter,
    text: &str,
    day: Option<NaiveDate>,
) -> Result<Entry, CommandError> {
    let timestamp = day
        .map(|day| anchor_to_day(day, Local::now()))
        .unwrap_or_else(Utc::now);
    let composed = EntryComposer::new(journal)
        .compose(timestamp, text, Vec::new())
        .await?;
    report_saved(presenter, &composed.entry, day);
    Ok(composed.entry)
}

/// Status line for a capture state, with the clock while recording
pub fn describe_state(state: &CaptureState, elapsed_secs: u64) -> String {
    match state {
        CaptureState::Recording => format!("recording {}", format_elapsed(elapsed_secs)),
        CaptureState::Failed(failure) => format!("failed: {}", failure),
        other => other.phase().to_string(),
    }
}
