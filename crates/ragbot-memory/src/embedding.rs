use ragbot_core::{RagbotError, RagbotResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for computing text embeddings (vector representations).
///
/// The same provider (same [`model_id`](EmbeddingProvider::model_id) and
/// [`dimension`](EmbeddingProvider::dimension)) must be used to build an
/// index and to query it; both values are pinned in the index manifest.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute embedding vector for a single text.
    async fn embed(&self, text: &str) -> RagbotResult<Vec<f32>>;

    /// Compute embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> RagbotResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the embedding vectors produced by this provider.
    fn dimension(&self) -> usize;

    /// Identifier of the embedding model.
    fn model_id(&self) -> &str;
}

/// Reject vectors of the wrong dimension or containing NaN/infinite values.
pub fn validate_embedding(vector: &[f32], dimension: usize) -> RagbotResult<()> {
    if vector.len() != dimension {
        return Err(RagbotError::EmbeddingProvider(format!(
            "expected {dimension}-dimensional vector, got {}",
            vector.len()
        )));
    }
    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(RagbotError::EmbeddingProvider(format!(
            "vector contains non-finite value at position {pos}"
        )));
    }
    Ok(())
}

/// Local bag-of-words embedding (no external API needed).
///
/// Hashes each lowercase word into a fixed-size vector with TF weights and
/// L2-normalizes the result. Deterministic: identical text always maps to
/// the identical vector. Useful offline and in tests; use [`HttpEmbedding`]
/// for semantic quality.
///
/// [`HttpEmbedding`]: crate::HttpEmbedding
pub struct LocalEmbedding {
    dimension: usize,
    model_id: String,
}

impl LocalEmbedding {
    /// A zero `dimension` is raised to 1.
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("local-bow-{dimension}"),
        }
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> RagbotResult<Vec<f32>> {
        if text.is_empty() {
            return Err(RagbotError::EmbeddingProvider(
                "Cannot embed empty text".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for word in &words {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }

        let total = words.len() as f32;
        if total == 0.0 {
            return Ok(vector);
        }

        // Three hash positions per word spread collisions out.
        for (word, count) in &freq {
            let tf = count / total;
            let hash1 = simple_hash(word.as_bytes()) as usize;
            let hash2 = simple_hash(&[word.as_bytes(), &[1u8]].concat()) as usize;
            let hash3 = simple_hash(&[word.as_bytes(), &[2u8]].concat()) as usize;

            vector[hash1 % self.dimension] += tf;
            vector[hash2 % self.dimension] += tf * 0.7;
            vector[hash3 % self.dimension] += tf * 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// FNV-1a.
fn simple_hash(data: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    #[tokio::test]
    async fn test_local_embedding_dimension() {
        let emb = LocalEmbedding::new(128);
        assert_eq!(emb.dimension(), 128);
        assert_eq!(emb.model_id(), "local-bow-128");
        let vec = emb.embed("hello world").await.unwrap();
        assert_eq!(vec.len(), 128);
    }

    #[tokio::test]
    async fn test_local_embedding_zero_dimension_is_clamped() {
        let emb = LocalEmbedding::new(0);
        assert_eq!(emb.dimension(), 1);
        assert_eq!(emb.model_id(), "local-bow-1");
        let vec = emb.embed("hello").await.unwrap();
        assert_eq!(vec.len(), 1);
        validate_embedding(&vec, 1).unwrap();
    }

    #[tokio::test]
    async fn test_local_embedding_normalized() {
        let emb = LocalEmbedding::default();
        let vec = emb.embed("the quick brown fox jumps").await.unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_local_embedding_similar_texts() {
        let emb = LocalEmbedding::default();
        let v1 = emb.embed("rust programming language").await.unwrap();
        let v2 = emb.embed("rust programming systems").await.unwrap();
        let v3 = emb.embed("cooking recipes for dinner").await.unwrap();

        let sim_12 = cosine_similarity(&v1, &v2);
        let sim_13 = cosine_similarity(&v1, &v3);
        assert!(
            sim_12 > sim_13,
            "sim(rust-rust)={sim_12} should be > sim(rust-cooking)={sim_13}"
        );
    }

    #[tokio::test]
    async fn test_local_embedding_single_letter_word() {
        let emb = LocalEmbedding::default();
        let vec = emb.embed("x").await.unwrap();
        assert!(vec.iter().any(|v| *v > 0.0));
    }

    #[tokio::test]
    async fn test_local_embedding_empty() {
        let emb = LocalEmbedding::default();
        assert!(matches!(
            emb.embed("").await,
            Err(RagbotError::EmbeddingProvider(_))
        ));
    }

    #[tokio::test]
    async fn test_local_embedding_deterministic() {
        let emb = LocalEmbedding::default();
        let v1 = emb.embed("test input").await.unwrap();
        let v2 = emb.embed("test input").await.unwrap();
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let emb = LocalEmbedding::default();
        let vecs = emb.embed_batch(&["hello", "world"]).await.unwrap();
        assert_eq!(vecs.len(), 2);
        assert_eq!(vecs[0].len(), 256);
    }

    #[test]
    fn test_validate_embedding() {
        assert!(validate_embedding(&[0.1, 0.2], 2).is_ok());
        assert!(validate_embedding(&[0.1], 2).is_err());
        assert!(validate_embedding(&[0.1, f32::NAN], 2).is_err());
        assert!(validate_embedding(&[f32::INFINITY, 0.0], 2).is_err());
    }
}
