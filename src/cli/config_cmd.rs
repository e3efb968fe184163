//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;
use crate::domain::transcription::Language;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;
    let value = normalize_config_value(key, value)?;

    let mut config = store.load().await?;
    *field_mut(&mut config, key) = Some(value.clone());
    store.save(&config).await?;

    let shown = if key == "api_key" {
        mask_api_key(&value)
    } else {
        value
    };
    presenter.success(&format!("{} = {}", key, shown));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;
    let config = store.load().await?;
    presenter.output(&display_value(&config, key));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, &display_value(&config, key));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

fn field_mut<'a>(config: &'a mut AppConfig, key: &str) -> &'a mut Option<String> {
    match key {
        "api_key" => &mut config.api_key,
        "language" => &mut config.language,
        "model" => &mut config.model,
        "data_dir" => &mut config.data_dir,
        _ => &mut config.max_duration,
    }
}

fn field<'a>(config: &'a AppConfig, key: &str) -> Option<&'a str> {
    match key {
        "api_key" => config.api_key.as_deref(),
        "language" => config.language.as_deref(),
        "model" => config.model.as_deref(),
        "data_dir" => config.data_dir.as_deref(),
        _ => config.max_duration.as_deref(),
    }
}

fn display_value(config: &AppConfig, key: &str) -> String {
    match field(config, key) {
        Some(v) if key == "api_key" => mask_api_key(v),
        Some(v) => v.to_string(),
        None => NOT_SET.to_string(),
    }
}

/// Validate a config value for its key and return the form to store
fn normalize_config_value(key: &str, value: &str) -> Result<String, ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };
    let value = value.trim();

    match key {
        "max_duration" => value
            .parse::<Duration>()
            .map(|duration| duration.to_string())
            .map_err(|e| invalid(e.to_string())),
        "language" => value
            .parse::<Language>()
            .map(|language| language.to_string())
            .map_err(|e| invalid(e.to_string())),
        "data_dir" => {
            if !std::path::Path::new(value).is_absolute() {
                return Err(invalid("Path must be absolute".to_string()));
            }
            Ok(value.to_string())
        }
        _ => {
            if value.is_empty() {
                return Err(invalid("Value must not be empty".to_string()));
            }
            Ok(value.to_string())
        }
    }
}

/// Mask API key for display (show first 4 and last 4 chars)
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
