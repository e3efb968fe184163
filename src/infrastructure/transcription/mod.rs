//! Speech-to-text adapters

mod gemini;

pub use gemini::{GeminiTranscriber, DEFAULT_BASE_URL};
