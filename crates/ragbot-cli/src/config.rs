//! `ragbot.toml` loading.

use anyhow::Context;
use ragbot_agent::{ModelConfig, API_KEY_ENV};
use ragbot_memory::{EmbeddingConfig, IndexConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "ragbot.toml";

#[derive(Debug, Default, Deserialize)]
pub struct RagbotConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

impl RagbotConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read an explicit config file, or `ragbot.toml` if present, or fall
    /// back to defaults.
    pub async fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !tokio::fs::try_exists(&default).await.unwrap_or(false) {
                    info!("No {DEFAULT_CONFIG_PATH} found, using defaults");
                    return Ok(Self::default().with_env_api_keys());
                }
                default
            }
        };

        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        info!(path = %path.display(), "Config loaded");
        Ok(config.with_env_api_keys())
    }

    /// Fill empty API keys from the environment.
    pub fn with_env_api_keys(mut self) -> Self {
        self.model = self.model.with_env_api_key();
        if self.embedding.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                self.embedding.api_key = key;
            }
        }
        self
    }
}
