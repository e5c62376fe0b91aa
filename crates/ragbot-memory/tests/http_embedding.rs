#![cfg(feature = "http-embeddings")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! `HttpEmbedding` against a mock OpenAI-compatible server.

use ragbot_core::RagbotError;
use ragbot_memory::{EmbeddingBackend, EmbeddingConfig, EmbeddingProvider, HttpEmbedding};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers with one `[len, 1.0, 0.0]` vector per input string.
struct EchoLengths;

impl Respond for EchoLengths {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let data: Vec<serde_json::Value> = body["input"]
            .as_array()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let len = text.as_str().unwrap().len() as f64;
                serde_json::json!({"index": i, "embedding": [len, 1.0, 0.0]})
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "object": "list",
            "data": data,
            "model": body["model"],
        }))
    }
}

fn config(server: &MockServer, batch_size: usize) -> EmbeddingConfig {
    EmbeddingConfig {
        provider: EmbeddingBackend::OpenAi,
        model_id: "text-embedding-3-small".to_string(),
        api_key: "sk-test".to_string(),
        api_base_url: Some(format!("{}/v1", server.uri())),
        dimension: 3,
        batch_size,
        request_timeout_secs: 5,
    }
}

#[tokio::test]
async fn embed_batch_splits_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(EchoLengths)
        .expect(2)
        .mount(&server)
        .await;

    let provider = HttpEmbedding::new(config(&server, 2)).unwrap();
    let vectors = provider.embed_batch(&["a", "bb", "ccc"]).await.unwrap();

    assert_eq!(vectors.len(), 3);
    assert_eq!(vectors[0][0], 1.0);
    assert_eq!(vectors[1][0], 2.0);
    assert_eq!(vectors[2][0], 3.0);
    assert_eq!(provider.model_id(), "text-embedding-3-small");
}

#[tokio::test]
async fn single_embed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(EchoLengths)
        .mount(&server)
        .await;

    let provider = HttpEmbedding::new(config(&server, 64)).unwrap();
    assert_eq!(provider.embed("hello").await.unwrap(), vec![5.0, 1.0, 0.0]);
}

#[tokio::test]
async fn server_error_is_embedding_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"error": {"message": "boom"}})),
        )
        .mount(&server)
        .await;

    let provider = HttpEmbedding::new(config(&server, 64)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, RagbotError::EmbeddingProvider(_)));
}

#[tokio::test]
async fn wrong_dimension_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"index": 0, "embedding": [1.0, 2.0]}]
        })))
        .mount(&server)
        .await;

    let provider = HttpEmbedding::new(config(&server, 64)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, RagbotError::EmbeddingProvider(_)));
}
