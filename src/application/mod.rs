//! Application layer - Use cases and port interfaces
//!
//! Contains the core journal operations and trait definitions
//! for external system interactions.

pub mod capture;
pub mod compose;
pub mod entries;
pub mod ports;
pub mod trash;

// Re-export use cases
pub use capture::{CaptureError, CaptureSession};
pub use compose::{Composed, EntryComposer, ImageFailure};
pub use entries::{EntryError, EntryRepository};
pub use trash::TrashCoordinator;
