//! Domain error types

use thiserror::Error;

/// A recording limit that is not `<n>h`, `<n>m`, `<n>s` or a combination
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected <number> followed by h, m or s (e.g., 30s, 2m30s, 1h)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a language tag is not a plausible BCP 47 tag
#[derive(Debug, Clone, Error)]
#[error("Invalid language: \"{input}\". Expected a language tag such as ja-JP, en-US or fr")]
pub struct InvalidLanguageError {
    pub input: String,
}

/// Error when an entry would carry neither text nor attachments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("An entry needs text or at least one photo")]
pub struct EmptyEntryError;

/// Config file and config value problems
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Cannot read the config file: {0}")]
    ReadError(String),

    /// The file exists but is not valid TOML for the known keys
    #[error("Config file is malformed: {0}")]
    ParseError(String),

    #[error("Cannot write the config file: {0}")]
    WriteError(String),

    #[error("Bad value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("A config file already exists at {0}")]
    AlreadyExists(String),
}
