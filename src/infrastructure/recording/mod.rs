//! Recording infrastructure module
//!
//! Microphone capture through cpal. Audio is mixed to mono, resampled to
//! 16kHz and encoded as FLAC for the transcription API.

mod cpal_recorder;
mod flac_encoder;

pub use cpal_recorder::CpalRecorder;
pub use flac_encoder::{encode_flac, EncodingError, TARGET_SAMPLE_RATE};
