//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: files on disk, the
//! microphone and the Gemini API.

mod atomic;
pub mod config;
pub mod media;
pub mod persistence;
pub mod recording;
pub mod transcription;

// Re-export adapters
pub use config::{default_data_dir, XdgConfigStore};
pub use media::FsAttachmentStore;
pub use persistence::{JsonEntryStore, MemoryEntryStore};
pub use recording::CpalRecorder;
pub use transcription::GeminiTranscriber;
