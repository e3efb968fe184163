//! System prompt value object

use super::language::Language;

/// Base instruction for dictated journal entries
const BASE_INSTRUCTION: &str = r#"You transcribe voice memos that the speaker is dictating into their personal journal.

Instructions:
- Write down what was said, in the language it was spoken
- Add punctuation and paragraph breaks where the speaker pauses
- Drop filler words, stutters and false starts
- Keep the speaker's own words and tone; do not summarize
- Output ONLY the entry text, with no title, quotes or commentary"#;

/// Value object representing the complete system prompt for transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    content: String,
}

impl SystemPrompt {
    /// Build the prompt for the expected dictation language
    pub fn build(language: &Language) -> Self {
        let content = format!(
            "{}\n\nExpected language: {} ({})",
            BASE_INSTRUCTION,
            language.display_name(),
            language.as_str()
        );
        Self { content }
    }

    /// Get the prompt content
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::build(&Language::default())
    }
}
