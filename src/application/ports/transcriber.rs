//! Speech-to-text port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::transcription::{AudioData, SystemPrompt};

/// Why a dictation produced no text
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    #[error("The transcription service rejected the API key")]
    InvalidApiKey,

    #[error("The transcription service is rate limiting requests; try again later")]
    RateLimited,

    /// The service answered but heard nothing worth writing down
    #[error("No speech was recognized")]
    EmptyResponse,

    #[error("Could not reach the transcription service: {0}")]
    RequestFailed(String),

    #[error("Unreadable reply from the transcription service: {0}")]
    ParseError(String),

    #[error("Transcription service error: {0}")]
    ApiError(String),
}

/// Turns one captured recording into journal text.
///
/// The capture session drops the returned future to cancel an in-flight
/// call, so implementations must not rely on running to completion.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio`, steering the model with `prompt`.
    /// Surrounding whitespace is trimmed; blank output is `EmptyResponse`.
    async fn transcribe(
        &self,
        audio: &AudioData,
        prompt: &SystemPrompt,
    ) -> Result<String, TranscriptionError>;
}
