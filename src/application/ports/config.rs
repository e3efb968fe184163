//! Config file port

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Where the file layer of the configuration lives
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the file layer. A missing file is an empty layer, not an error.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Replace the file with `config`, creating parent directories
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    fn path(&self) -> PathBuf;

    /// Write the built-in defaults. Refuses to overwrite an existing file.
    async fn init(&self) -> Result<(), ConfigError>;
}
