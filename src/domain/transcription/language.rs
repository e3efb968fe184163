//! Dictation language value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidLanguageError;

/// Default dictation language
pub const DEFAULT_LANGUAGE: &str = "ja-JP";

/// BCP 47-style language tag the speech engine should expect, e.g. `ja-JP`.
///
/// Only the shape is checked: a 2-3 letter primary subtag followed by
/// optional alphanumeric subtags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    /// Get the tag
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// English name for well-known tags, falling back to the tag itself
    pub fn display_name(&self) -> &str {
        let primary = self.0.split('-').next().unwrap_or_default();
        match primary {
            "ja" => "Japanese",
            "en" => "English",
            "de" => "German",
            "fr" => "French",
            "es" => "Spanish",
            "it" => "Italian",
            "ko" => "Korean",
            "zh" => "Chinese",
            "pt" => "Portuguese",
            _ => &self.0,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }
}

impl FromStr for Language {
    type Err = InvalidLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        let mut parts = tag.split('-');
        let primary = parts.next().unwrap_or_default();

        let primary_ok =
            (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
        let rest_ok = parts.all(|p| {
            (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric())
        });

        if !primary_ok || !rest_ok {
            return Err(InvalidLanguageError {
                input: s.to_string(),
            });
        }

        Ok(Self(tag.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
