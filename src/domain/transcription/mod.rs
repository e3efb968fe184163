//! Transcription domain module

mod audio_data;
mod language;
mod system_prompt;

pub use audio_data::{AudioData, AudioMimeType};
pub use language::Language;
pub use system_prompt::SystemPrompt;
