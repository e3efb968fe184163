//! VoiceLog - a day-by-day journal fed by text, photos and dictation
//!
//! Entries carry text and photo attachments, are bucketed by calendar
//! day, and move through a trash before permanent deletion. Dictation
//! records from the microphone and transcribes with Google Gemini.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Entries, attachments, the capture state machine, value objects and errors
//! - **Application**: Use cases (entry repository, composer, trash, capture session) and port traits
//! - **Infrastructure**: Adapters (JSON entry file, image store, cpal recorder, Gemini, XDG config)
//! - **CLI**: Command-line interface, capture host and its socket protocol

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
