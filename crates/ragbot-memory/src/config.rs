use crate::embedding::{EmbeddingProvider, LocalEmbedding};
use ragbot_core::{RagbotError, RagbotResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Which embedding implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// In-process hashed bag-of-words ([`LocalEmbedding`]).
    Local,
    /// Any OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

/// `[embedding]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_backend")]
    pub provider: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: String,
    pub api_base_url: Option<String>,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_backend() -> EmbeddingBackend {
    EmbeddingBackend::Local
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    256
}

fn default_batch_size() -> usize {
    64
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_backend(),
            model_id: default_embedding_model(),
            api_key: String::new(),
            api_base_url: None,
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1")
    }

    /// Instantiate the configured provider.
    pub fn build_provider(&self) -> RagbotResult<Arc<dyn EmbeddingProvider>> {
        if self.dimension == 0 {
            return Err(RagbotError::Config(
                "embedding dimension must be positive".to_string(),
            ));
        }
        match self.provider {
            EmbeddingBackend::Local => Ok(Arc::new(LocalEmbedding::new(self.dimension))),
            #[cfg(feature = "http-embeddings")]
            EmbeddingBackend::OpenAi => Ok(Arc::new(crate::HttpEmbedding::new(self.clone())?)),
            #[cfg(not(feature = "http-embeddings"))]
            EmbeddingBackend::OpenAi => Err(RagbotError::Config(
                "ragbot-memory was built without the `http-embeddings` feature".to_string(),
            )),
        }
    }
}

/// `[index]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Persisted index file.
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
    /// Directory holding the documents to index.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub chunk_overlap: usize,
}

fn default_index_path() -> PathBuf {
    PathBuf::from("knowledge_base/index.jsonl")
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("knowledge_base/data")
}

fn default_chunk_size() -> usize {
    1000
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            source_dir: default_source_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
        }
    }
}
