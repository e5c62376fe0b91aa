use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when `api_key` is left empty.
pub const API_KEY_ENV: &str = "RAGBOT_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    OpenRouter,
    /// Groq cloud inference, OpenAI-compatible API.
    Groq,
    /// Google Gemini through its OpenAI-compatible endpoint.
    Gemini,
    /// Local Ollama server.
    Ollama,
}

/// `[model]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: LlmProvider,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: String,
    pub api_base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Ceiling on generation cycles per agent run.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Timeout applied to every provider call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Number of chunks fetched per retrieval.
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
}

fn default_provider() -> LlmProvider {
    LlmProvider::Gemini
}

fn default_model_id() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_turns() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_retrieval_top_k() -> usize {
    3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: default_model_id(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_turns: default_max_turns(),
            request_timeout_secs: default_request_timeout_secs(),
            retrieval_top_k: default_retrieval_top_k(),
        }
    }
}

impl ModelConfig {
    /// API root including the version segment, without a trailing slash.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                LlmProvider::OpenAi => "https://api.openai.com/v1",
                LlmProvider::OpenRouter => "https://openrouter.ai/api/v1",
                LlmProvider::Groq => "https://api.groq.com/openai/v1",
                LlmProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
                LlmProvider::Ollama => "http://localhost:11434/v1",
            }
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Fill an empty `api_key` from [`API_KEY_ENV`].
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                self.api_key = key;
            }
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: ModelConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider, LlmProvider::Gemini);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_turns, 10);
        assert_eq!(config.retrieval_top_k, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_chat_url_per_provider() {
        let mut config = ModelConfig {
            provider: LlmProvider::Groq,
            ..ModelConfig::default()
        };
        assert_eq!(
            config.chat_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );

        config.provider = LlmProvider::Gemini;
        assert_eq!(
            config.chat_url(),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );

        config.api_base_url = Some("http://127.0.0.1:9999/v1/".to_string());
        assert_eq!(config.chat_url(), "http://127.0.0.1:9999/v1/chat/completions");
    }

    #[test]
    fn test_provider_names() {
        let parsed: ModelConfig = toml::from_str(
            r#"
            provider = "openrouter"
            model_id = "meta-llama/llama-3-8b"
            max_turns = 4
            "#,
        )
        .unwrap();
        assert_eq!(parsed.provider, LlmProvider::OpenRouter);
        assert_eq!(parsed.max_turns, 4);
        assert_eq!(serde_json::to_string(&LlmProvider::OpenAi).unwrap(), "\"openai\"");
    }

    #[test]
    fn test_explicit_key_is_kept() {
        let config = ModelConfig {
            api_key: "sk-explicit".to_string(),
            ..ModelConfig::default()
        }
        .with_env_api_key();
        assert_eq!(config.api_key, "sk-explicit");
    }
}
