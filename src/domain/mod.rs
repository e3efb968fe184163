//! Domain layer - Core business logic
//!
//! Contains value objects, entities, state machines and domain errors.
//! This layer has no dependencies on external systems.

pub mod capture;
pub mod config;
pub mod entry;
pub mod error;
pub mod recording;
pub mod transcription;

// Re-export common types
pub use capture::{CaptureFailure, CaptureMachine, CapturePhase, CaptureState};
pub use config::AppConfig;
pub use entry::{Attachment, AttachmentId, Entry, EntryId, EntryStatus};
pub use error::*;
pub use recording::Duration;
pub use transcription::{AudioData, AudioMimeType, Language, SystemPrompt};
