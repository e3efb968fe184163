//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod entry_store;
pub mod media_store;
pub mod recorder;
pub mod transcriber;

// Re-export common types
pub use config::ConfigStore;
pub use entry_store::{EntryQuery, EntryStore, SortOrder, StoreError};
pub use media_store::{MediaError, MediaStore, SavedImage};
pub use recorder::{Recorder, RecordingError};
pub use transcriber::{Transcriber, TranscriptionError};
