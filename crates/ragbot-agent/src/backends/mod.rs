pub mod openai;

use crate::llm::LlmResponse;
use async_trait::async_trait;
use ragbot_core::{Message, RagbotResult, ToolDescriptor};

/// Trait for generation provider backends.
///
/// To add a new provider: implement `LlmBackend` in `backends/`, add the
/// variant to `LlmProvider` in `config.rs` and wire it in `LlmClient::new()`.
/// Tests implement it directly with scripted responses.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Ask for the next action given the conversation so far and the
    /// actions the provider may request.
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> RagbotResult<LlmResponse>;
}
