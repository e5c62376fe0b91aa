//! Knowledge indexing and retrieval for Ragbot.
//!
//! Offline, the [`Indexer`] loads documents from a directory, splits them
//! into overlapping fixed-size chunks, embeds every chunk and persists the
//! resulting [`VectorIndex`] atomically. Online, the [`RetrievalService`]
//! embeds a query and returns the top-k chunk texts from the loaded index.
//!
//! # Main types
//!
//! - [`Document`] / [`Chunk`]: Raw text and the bounded slices cut from it.
//! - [`FixedSizeChunker`]: Character-based sliding window splitter.
//! - [`EmbeddingProvider`]: Trait for computing embedding vectors.
//! - [`LocalEmbedding`]: Deterministic hashed bag-of-words embedder.
//! - [`HttpEmbedding`]: OpenAI-compatible `/embeddings` client.
//! - [`VectorIndex`]: Exact nearest-neighbor index with JSONL persistence.
//! - [`Indexer`]: load → chunk → embed → store pipeline.
//! - [`RetrievalService`]: Query-time similarity search.

/// Chunking strategy.
pub mod chunking;
/// Embedding and index configuration.
pub mod config;
/// Documents, chunks and the document loader.
pub mod document;
/// Embedding provider trait and local implementation.
pub mod embedding;
/// OpenAI-compatible HTTP embedding provider.
#[cfg(feature = "http-embeddings")]
pub mod http_embedding;
/// Vector index and its on-disk format.
pub mod index;
/// Offline index build pipeline.
pub mod indexer;
/// Query-time retrieval.
pub mod retrieval;

pub use chunking::FixedSizeChunker;
pub use config::{EmbeddingBackend, EmbeddingConfig, IndexConfig};
pub use document::{load_documents, Chunk, Document};
pub use embedding::{validate_embedding, EmbeddingProvider, LocalEmbedding};
#[cfg(feature = "http-embeddings")]
pub use http_embedding::HttpEmbedding;
pub use index::{DistanceMetric, IndexEntry, IndexManifest, SearchResult, VectorIndex};
pub use indexer::{build_index, IndexStats, Indexer};
pub use retrieval::{RetrievalService, KNOWLEDGE_UNAVAILABLE};
