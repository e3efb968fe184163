//! Journal configuration as stored in the config file

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::recording::Duration;
use crate::domain::transcription::Language;

/// Default Gemini model used for transcription
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// One layer of configuration (defaults, file, environment or flags).
///
/// Values are kept as raw strings so a bad value in the file never stops
/// unrelated commands; each consumer validates what it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub model: Option<String>,
    pub data_dir: Option<String>,
    pub max_duration: Option<String>,
}

impl AppConfig {
    /// Built-in layer. `data_dir` stays unset here; the platform data
    /// directory is filled in when the journal is opened.
    pub fn defaults() -> Self {
        Self {
            language: Some(Language::default().to_string()),
            model: Some(DEFAULT_MODEL.to_string()),
            max_duration: Some(Duration::default_max_duration().to_string()),
            ..Self::empty()
        }
    }

    /// A layer that sets nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stack `upper` on top of `self`. Unset fields fall through.
    pub fn merge(self, upper: Self) -> Self {
        Self {
            api_key: upper.api_key.or(self.api_key),
            language: upper.language.or(self.language),
            model: upper.model.or(self.model),
            data_dir: upper.data_dir.or(self.data_dir),
            max_duration: upper.max_duration.or(self.max_duration),
        }
    }

    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Configured journal directory; blank counts as unset
    pub fn data_dir_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_capture_settings_only() {
        let config = AppConfig::defaults();
        assert!(config.api_key.is_none());
        assert!(config.data_dir.is_none());
        assert_eq!(config.language.as_deref(), Some("ja-JP"));
        assert_eq!(config.model.as_deref(), Some(DEFAULT_MODEL));
        assert_eq!(config.max_duration.as_deref(), Some("5m"));
    }

    #[test]
    fn upper_layer_wins_field_by_field() {
        let file = AppConfig {
            api_key: Some("file-key".to_string()),
            data_dir: Some("/srv/journal".to_string()),
            ..Default::default()
        };
        let env = AppConfig {
            api_key: Some("env-key".to_string()),
            ..Default::default()
        };
        let flags = AppConfig {
            data_dir: Some("/tmp/journal".to_string()),
            ..Default::default()
        };

        let merged = AppConfig::defaults().merge(file).merge(env).merge(flags);

        assert_eq!(merged.api_key.as_deref(), Some("env-key"));
        assert_eq!(merged.data_dir_path(), Some(PathBuf::from("/tmp/journal")));
        assert_eq!(merged.language.as_deref(), Some("ja-JP"));
    }

    #[test]
    fn merging_an_empty_layer_changes_nothing() {
        let merged = AppConfig::defaults().merge(AppConfig::empty());
        assert_eq!(merged, AppConfig::defaults());
    }

    #[test]
    fn model_falls_back_to_default() {
        assert_eq!(AppConfig::empty().model_or_default(), DEFAULT_MODEL);
    }

    #[test]
    fn blank_data_dir_is_unset() {
        let config = AppConfig {
            data_dir: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.data_dir_path().is_none());
    }
}
