use crate::config::EmbeddingConfig;
use crate::embedding::{validate_embedding, EmbeddingProvider};
use async_trait::async_trait;
use ragbot_core::{RagbotError, RagbotResult};
use std::time::Duration;
use tracing::debug;

/// OpenAI-compatible `/embeddings` client.
///
/// Works with OpenAI, Gemini's OpenAI-compatible endpoint, Ollama and any
/// other server implementing the same request shape. Batches are split into
/// requests of at most `batch_size` inputs. Every returned vector is checked
/// for dimension and finiteness; failures are never retried.
pub struct HttpEmbedding {
    config: EmbeddingConfig,
    http: reqwest::Client,
}

impl HttpEmbedding {
    pub fn new(config: EmbeddingConfig) -> RagbotResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| RagbotError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    async fn request(&self, inputs: &[&str]) -> RagbotResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url().trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.config.model_id,
            "input": inputs,
        });

        let mut request = self.http.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| RagbotError::EmbeddingProvider(format!("request failed: {e}")))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp.json().await.map_err(|e| {
            RagbotError::EmbeddingProvider(format!("invalid response body ({status}): {e}"))
        })?;

        if !status.is_success() {
            return Err(RagbotError::EmbeddingProvider(format!(
                "embedding API error {status}: {resp_body}"
            )));
        }

        parse_embedding_response(&resp_body, inputs.len(), self.config.dimension)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, text: &str) -> RagbotResult<Vec<f32>> {
        let mut vectors = self.request(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagbotError::EmbeddingProvider("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> RagbotResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            debug!(size = batch.len(), "Requesting embedding batch");
            results.extend(self.request(batch).await?);
        }
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

/// Extract vectors from an OpenAI-style `{"data": [{"index", "embedding"}]}`
/// body, ordered by `index`.
pub fn parse_embedding_response(
    body: &serde_json::Value,
    expected: usize,
    dimension: usize,
) -> RagbotResult<Vec<Vec<f32>>> {
    let data = body["data"]
        .as_array()
        .ok_or_else(|| RagbotError::EmbeddingProvider("response has no `data` array".to_string()))?;

    if data.len() != expected {
        return Err(RagbotError::EmbeddingProvider(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }

    let mut indexed = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(pos);
        let values = item["embedding"].as_array().ok_or_else(|| {
            RagbotError::EmbeddingProvider(format!("item {pos} has no `embedding` array"))
        })?;
        let vector = values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| {
                RagbotError::EmbeddingProvider(format!("item {pos} contains a non-numeric value"))
            })?;
        validate_embedding(&vector, dimension)?;
        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orders_by_index() {
        let body = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vectors = parse_embedding_response(&body, 2, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_parse_rejects_wrong_dimension() {
        let body = serde_json::json!({"data": [{"index": 0, "embedding": [1.0, 0.0, 0.5]}]});
        assert!(matches!(
            parse_embedding_response(&body, 1, 2),
            Err(RagbotError::EmbeddingProvider(_))
        ));
    }

    #[test]
    fn test_parse_rejects_count_mismatch() {
        let body = serde_json::json!({"data": []});
        assert!(parse_embedding_response(&body, 1, 2).is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let body = serde_json::json!({"data": [{"index": 0, "embedding": [1.0, "NaN"]}]});
        assert!(parse_embedding_response(&body, 1, 2).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_data() {
        let body = serde_json::json!({"error": {"message": "bad key"}});
        assert!(parse_embedding_response(&body, 1, 2).is_err());
    }
}
