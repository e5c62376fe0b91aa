use crate::embedding::{validate_embedding, EmbeddingProvider};
use crate::index::{SearchResult, VectorIndex};
use ragbot_core::{RagbotError, RagbotResult};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returned by [`RetrievalService::retrieve`] when no index could be loaded.
pub const KNOWLEDGE_UNAVAILABLE: &str = "Knowledge base is not available.";

/// Separator placed between retrieved chunk texts.
const CHUNK_SEPARATOR: &str = "\n\n";

/// Query-time similarity search over a read-only [`VectorIndex`].
///
/// The index is loaded once and shared behind an `Arc`; the service is cheap
/// to clone and safe to call from many concurrent agent loops. When the index
/// is missing, corrupt, or pinned to a different embedding model the service
/// stays up in a degraded mode and answers with [`KNOWLEDGE_UNAVAILABLE`].
#[derive(Clone)]
pub struct RetrievalService {
    index: Option<Arc<VectorIndex>>,
    unavailable_reason: Option<String>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl RetrievalService {
    /// Wrap an already-loaded index, checking that `embedder` matches the
    /// model and dimension recorded in the index manifest.
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let manifest = index.manifest();
        if manifest.embedding_model != embedder.model_id()
            || manifest.dimension != embedder.dimension()
        {
            let reason = format!(
                "index was built with '{}' ({} dims) but queries use '{}' ({} dims)",
                manifest.embedding_model,
                manifest.dimension,
                embedder.model_id(),
                embedder.dimension()
            );
            warn!(%reason, "Embedding model mismatch, knowledge base disabled");
            return Self::unavailable(embedder, reason);
        }

        Self {
            index: Some(index),
            unavailable_reason: None,
            embedder,
        }
    }

    /// A service with no index; every retrieval returns the sentinel.
    pub fn unavailable(embedder: Arc<dyn EmbeddingProvider>, reason: impl Into<String>) -> Self {
        Self {
            index: None,
            unavailable_reason: Some(reason.into()),
            embedder,
        }
    }

    /// Load the persisted index at `path`. Never fails: load errors are
    /// logged and leave the service in its degraded mode.
    pub async fn open(path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        match VectorIndex::load(path).await {
            Ok(index) => {
                info!(
                    path = %path.display(),
                    entries = index.len(),
                    model = %index.manifest().embedding_model,
                    "Knowledge index loaded"
                );
                Self::new(Arc::new(index), embedder)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error loading knowledge index");
                Self::unavailable(embedder, e.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.index.is_some()
    }

    pub fn index(&self) -> Option<&Arc<VectorIndex>> {
        self.index.as_ref()
    }

    /// Why the index is unavailable, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }

    /// Embed `query` and return the `k` nearest chunks, best first.
    pub async fn search(&self, query: &str, k: usize) -> RagbotResult<Vec<SearchResult>> {
        let index = self.index.as_ref().ok_or_else(|| {
            RagbotError::IndexUnavailable(
                self.unavailable_reason
                    .clone()
                    .unwrap_or_else(|| "no index loaded".to_string()),
            )
        })?;

        let query = query.trim();
        if query.is_empty() || index.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await.map_err(|e| match e {
            RagbotError::EmbeddingProvider(_) => e,
            other => RagbotError::EmbeddingProvider(other.to_string()),
        })?;
        validate_embedding(&embedding, index.dimension())?;

        index.search(&embedding, k.max(1))
    }

    /// Top-k chunk texts joined by a blank line.
    ///
    /// Returns [`KNOWLEDGE_UNAVAILABLE`] when no index is loaded and an empty
    /// string when nothing matches. Embedding failures are propagated.
    pub async fn retrieve(&self, query: &str, k: usize) -> RagbotResult<String> {
        if !self.is_available() {
            return Ok(KNOWLEDGE_UNAVAILABLE.to_string());
        }

        let results = self.search(query, k).await?;
        debug!(query, k, hits = results.len(), "Retrieved knowledge");

        Ok(results
            .iter()
            .map(|r| r.entry.text.as_str())
            .collect::<Vec<_>>()
            .join(CHUNK_SEPARATOR))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::embedding::LocalEmbedding;
    use crate::index::{DistanceMetric, IndexEntry};
    use std::collections::HashMap;

    async fn service_with(texts: &[&str]) -> RetrievalService {
        let embedder = Arc::new(LocalEmbedding::new(256));
        let mut index = VectorIndex::new(256, embedder.model_id(), DistanceMetric::Cosine);
        for text in texts {
            index
                .insert(IndexEntry {
                    text: text.to_string(),
                    embedding: embedder.embed(text).await.unwrap(),
                    metadata: HashMap::new(),
                })
                .unwrap();
        }
        RetrievalService::new(Arc::new(index), embedder)
    }

    #[tokio::test]
    async fn test_retrieve_orders_by_similarity() {
        let service = service_with(&[
            "chocolate cake baking recipe",
            "rust ownership and borrowing",
            "rust async runtime tokio",
        ])
        .await;
        let result = service.retrieve("rust ownership", 2).await.unwrap();
        let parts: Vec<&str> = result.split("\n\n").collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "rust ownership and borrowing");
        assert!(!result.contains("chocolate"));
    }

    #[tokio::test]
    async fn test_retrieve_empty_index() {
        let service = service_with(&[]).await;
        assert!(service.is_available());
        assert_eq!(service.retrieve("anything", 3).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_retrieve_blank_query() {
        let service = service_with(&["some text"]).await;
        assert_eq!(service.retrieve("   ", 3).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_retrieve_k_zero_treated_as_one() {
        let service = service_with(&["alpha", "beta"]).await;
        assert_eq!(service.retrieve("alpha", 0).await.unwrap(), "alpha");
    }

    #[tokio::test]
    async fn test_unavailable_returns_sentinel() {
        let service =
            RetrievalService::unavailable(Arc::new(LocalEmbedding::default()), "not built");
        assert!(!service.is_available());
        assert_eq!(service.unavailable_reason(), Some("not built"));
        assert_eq!(
            service.retrieve("query", 3).await.unwrap(),
            KNOWLEDGE_UNAVAILABLE
        );
        assert!(matches!(
            service.search("query", 3).await,
            Err(RagbotError::IndexUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_model_mismatch_disables_index() {
        let index = VectorIndex::new(64, "some-other-model", DistanceMetric::Cosine);
        let service = RetrievalService::new(Arc::new(index), Arc::new(LocalEmbedding::new(64)));
        assert!(!service.is_available());
        assert_eq!(
            service.retrieve("query", 3).await.unwrap(),
            KNOWLEDGE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_open_missing_index() {
        let tmp = tempfile::tempdir().unwrap();
        let service = RetrievalService::open(
            &tmp.path().join("index.jsonl"),
            Arc::new(LocalEmbedding::default()),
        )
        .await;
        assert!(!service.is_available());
        assert_eq!(
            service.retrieve("query", 3).await.unwrap(),
            KNOWLEDGE_UNAVAILABLE
        );
    }
}
