//! Recording port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::transcription::AudioData;

/// Recording errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Recording failed: {0}")]
    RecordingFailed(String),

    #[error("Not recording")]
    NotRecording,

    #[error("No audio device available")]
    NoAudioDevice,
}

/// Port for open-ended microphone capture.
///
/// One capture target at a time: `start` opens it, `stop` closes it and
/// hands back the encoded audio, `cancel` closes it and drops the audio.
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Whether the user has granted microphone access.
    ///
    /// The session only consumes this answer; asking for access is the
    /// host's job.
    fn permission_granted(&self) -> bool;

    /// Open a new capture target and begin buffering audio
    async fn start(&self) -> Result<(), RecordingError>;

    /// Close the capture target and return the recorded audio
    async fn stop(&self) -> Result<AudioData, RecordingError>;

    /// Close the capture target without returning data
    async fn cancel(&self) -> Result<(), RecordingError>;
}
