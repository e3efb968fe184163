//! The captured audio handle passed from recorder to transcriber

use std::fmt;

use base64::Engine;

use crate::domain::recording::format_elapsed;

/// Container of the encoded audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMimeType {
    /// Lossless and accepted inline by the transcription API
    #[default]
    Flac,
}

impl AudioMimeType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finished recording. Never persisted; it lives only until the
/// transcription that consumes it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioData {
    data: Vec<u8>,
    mime_type: AudioMimeType,
    duration_ms: u64,
}

impl AudioData {
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self {
            data,
            mime_type,
            duration_ms: 0,
        }
    }

    /// Attach the recorded length
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Recorded length in milliseconds, 0 when unknown
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn human_readable_size(&self) -> String {
        let bytes = self.data.len() as f64;
        match self.data.len() {
            n if n < 1024 => format!("{} B", n),
            n if n < 1024 * 1024 => format!("{:.1} KB", bytes / 1024.0),
            _ => format!("{:.1} MB", bytes / (1024.0 * 1024.0)),
        }
    }

    /// Length and size for progress messages, e.g. `0:42, 310.2 KB`
    pub fn summary(&self) -> String {
        match self.duration_ms {
            0 => self.human_readable_size(),
            ms => format!("{}, {}", format_elapsed(ms / 1000), self.human_readable_size()),
        }
    }

    /// Body for inline upload
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_pick_a_unit() {
        let sized = |n: usize| AudioData::new(vec![0u8; n], AudioMimeType::Flac).human_readable_size();
        assert_eq!(sized(500), "500 B");
        assert_eq!(sized(2048), "2.0 KB");
        assert_eq!(sized(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn summary_includes_length_when_known() {
        let audio = AudioData::new(vec![0u8; 100], AudioMimeType::Flac);
        assert_eq!(audio.summary(), "100 B");
        assert_eq!(audio.with_duration_ms(42_900).summary(), "0:42, 100 B");
    }

    #[test]
    fn base64_decodes_back() {
        let audio = AudioData::new(vec![1, 2, 3, 4], AudioMimeType::default());
        assert_eq!(audio.mime_type().to_string(), "audio/flac");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(audio.to_base64())
            .unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 4]);
    }
}
