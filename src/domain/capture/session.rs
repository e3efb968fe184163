//! Capture session state machine

use std::fmt;
use thiserror::Error;

/// Capture phases, without payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CapturePhase {
    #[default]
    Idle,
    Recording,
    Stopping,
    Transcribing,
    Completed,
    Failed,
}

impl CapturePhase {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Transcribing => "transcribing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Check if the cycle has produced an outcome awaiting acknowledgment
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a capture cycle ended without text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureFailure {
    #[error("Recording failed: {0}")]
    Recording(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcription was cancelled")]
    Cancelled,
}

/// Capture state, carrying the cycle's outcome once there is one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Recording,
    Stopping,
    Transcribing,
    Completed { text: String },
    Failed(CaptureFailure),
}

impl CaptureState {
    /// Phase of this state
    pub fn phase(&self) -> CapturePhase {
        match self {
            Self::Idle => CapturePhase::Idle,
            Self::Recording => CapturePhase::Recording,
            Self::Stopping => CapturePhase::Stopping,
            Self::Transcribing => CapturePhase::Transcribing,
            Self::Completed { .. } => CapturePhase::Completed,
            Self::Failed(_) => CapturePhase::Failed,
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.phase())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: CapturePhase,
    pub action: String,
}

/// Capture session entity.
/// Manages state transitions for one record -> stop -> transcribe cycle.
///
/// State machine:
///   IDLE -> RECORDING (start_recording)
///   TRANSCRIBING -> IDLE (supersede, a new cycle replaces a pending one)
///   RECORDING -> STOPPING (begin_stop)
///   RECORDING -> IDLE (cancel_recording)
///   STOPPING -> TRANSCRIBING (begin_transcribing)
///   STOPPING -> FAILED (fail)
///   TRANSCRIBING -> COMPLETED (complete)
///   TRANSCRIBING -> FAILED (fail, cancel_transcription)
///   COMPLETED | FAILED -> IDLE (reset)
#[derive(Debug, Default)]
pub struct CaptureMachine {
    state: CaptureState,
}

impl CaptureMachine {
    /// Create a new machine in idle state
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Get the current phase
    pub fn phase(&self) -> CapturePhase {
        self.state.phase()
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.phase(),
            action: action.to_string(),
        }
    }

    fn require(&self, allowed: &[CapturePhase], action: &str) -> Result<(), InvalidStateTransition> {
        if allowed.contains(&self.phase()) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    /// Check whether a new cycle may begin, without transitioning.
    /// A pending transcription may be superseded; anything else must be idle.
    pub fn ensure_can_start(&self) -> Result<(), InvalidStateTransition> {
        self.require(
            &[CapturePhase::Idle, CapturePhase::Transcribing],
            "start recording",
        )
    }

    /// Transition from TRANSCRIBING to IDLE, dropping the pending cycle
    pub fn supersede(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(&[CapturePhase::Transcribing], "supersede transcription")?;
        self.state = CaptureState::Idle;
        Ok(())
    }

    /// Transition from IDLE to RECORDING
    pub fn start_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(&[CapturePhase::Idle], "start recording")?;
        self.state = CaptureState::Recording;
        Ok(())
    }

    /// Transition from RECORDING to STOPPING
    pub fn begin_stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(&[CapturePhase::Recording], "stop recording")?;
        self.state = CaptureState::Stopping;
        Ok(())
    }

    /// Transition from RECORDING to IDLE (discard the audio)
    pub fn cancel_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(&[CapturePhase::Recording], "cancel recording")?;
        self.state = CaptureState::Idle;
        Ok(())
    }

    /// Transition from STOPPING to TRANSCRIBING
    pub fn begin_transcribing(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(&[CapturePhase::Stopping], "begin transcribing")?;
        self.state = CaptureState::Transcribing;
        Ok(())
    }

    /// Transition from TRANSCRIBING to COMPLETED
    pub fn complete(&mut self, text: String) -> Result<(), InvalidStateTransition> {
        self.require(&[CapturePhase::Transcribing], "complete transcription")?;
        self.state = CaptureState::Completed { text };
        Ok(())
    }

    /// Transition from STOPPING or TRANSCRIBING to FAILED
    pub fn fail(&mut self, failure: CaptureFailure) -> Result<(), InvalidStateTransition> {
        self.require(
            &[CapturePhase::Stopping, CapturePhase::Transcribing],
            "fail capture",
        )?;
        self.state = CaptureState::Failed(failure);
        Ok(())
    }

    /// Transition from TRANSCRIBING to FAILED (cancelled)
    pub fn cancel_transcription(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(&[CapturePhase::Transcribing], "cancel transcription")?;
        self.state = CaptureState::Failed(CaptureFailure::Cancelled);
        Ok(())
    }

    /// Transition from COMPLETED or FAILED to IDLE, discarding the outcome
    pub fn reset(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(
            &[CapturePhase::Completed, CapturePhase::Failed],
            "reset",
        )?;
        self.state = CaptureState::Idle;
        Ok(())
    }
}
