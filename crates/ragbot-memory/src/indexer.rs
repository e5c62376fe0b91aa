use crate::chunking::FixedSizeChunker;
use crate::document::load_documents;
use crate::embedding::{validate_embedding, EmbeddingProvider};
use crate::index::{DistanceMetric, IndexEntry, VectorIndex};
use ragbot_core::{RagbotError, RagbotResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Summary of a completed index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub path: PathBuf,
}

/// Offline pipeline: load → chunk → embed → store.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    metric: DistanceMetric,
    batch_size: usize,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            metric: DistanceMetric::Cosine,
            batch_size: 64,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Number of chunks handed to the provider per `embed_batch` call.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Build an in-memory index from every document under `source`.
    ///
    /// Fails with [`RagbotError::DataNotFound`] when there is nothing to
    /// index and with [`RagbotError::EmbeddingProvider`] when the provider
    /// fails or returns malformed vectors.
    pub async fn build(
        &self,
        source: &Path,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> RagbotResult<VectorIndex> {
        self.build_counted(source, chunk_size, chunk_overlap)
            .await
            .map(|(index, _)| index)
    }

    async fn build_counted(
        &self,
        source: &Path,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> RagbotResult<(VectorIndex, usize)> {
        let chunker = FixedSizeChunker::new(chunk_size, chunk_overlap)?;

        let documents = load_documents(source).await?;
        if documents.is_empty() {
            return Err(RagbotError::DataNotFound(format!(
                "no readable documents under '{}'",
                source.display()
            )));
        }

        let chunks = chunker.chunk_all(&documents);
        if chunks.is_empty() {
            return Err(RagbotError::DataNotFound(format!(
                "documents under '{}' contain no text",
                source.display()
            )));
        }
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            chunk_size,
            chunk_overlap,
            "Chunked documents"
        );

        let dimension = self.embedder.dimension();
        let mut index = VectorIndex::new(dimension, self.embedder.model_id(), self.metric);

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
                error!(error = %e, "Embedding failed during index build");
                match e {
                    RagbotError::EmbeddingProvider(_) => e,
                    other => RagbotError::EmbeddingProvider(other.to_string()),
                }
            })?;

            if embeddings.len() != batch.len() {
                return Err(RagbotError::EmbeddingProvider(format!(
                    "provider returned {} embeddings for {} chunks",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                validate_embedding(&embedding, dimension)?;
                index.insert(IndexEntry {
                    text: chunk.text.clone(),
                    embedding,
                    metadata: chunk.metadata(),
                })?;
            }
        }

        Ok((index, documents.len()))
    }

    /// Build from `source` and persist to `output`, replacing any existing
    /// index there. Nothing is written if the build fails.
    pub async fn build_to(
        &self,
        source: &Path,
        output: &Path,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> RagbotResult<IndexStats> {
        let (index, documents) = self
            .build_counted(source, chunk_size, chunk_overlap)
            .await?;
        index.save(output).await?;

        Ok(IndexStats {
            documents,
            chunks: index.len(),
            dimension: index.dimension(),
            path: output.to_path_buf(),
        })
    }
}

/// Offline indexing entry point: build the index for `source` with
/// `embedder` and write it to `output`.
pub async fn build_index(
    embedder: Arc<dyn EmbeddingProvider>,
    source: &Path,
    output: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> RagbotResult<IndexStats> {
    Indexer::new(embedder)
        .build_to(source, output, chunk_size, chunk_overlap)
        .await
}
