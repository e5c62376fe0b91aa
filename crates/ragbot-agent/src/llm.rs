use crate::backends::openai::OpenAiBackend;
use crate::backends::LlmBackend;
use crate::config::ModelConfig;
use ragbot_core::{Message, RagbotError, RagbotResult, ToolCall, ToolDescriptor};
use std::time::Duration;

/// Response from the generation provider: final text or a request to invoke
/// one or more actions.
#[derive(Debug, Clone)]
pub enum LlmResponse {
    Text(String),
    ToolUse {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
}

/// LLM client that dispatches to the correct provider backend.
///
/// Every call is bounded by the configured request timeout; an expired call
/// surfaces as [`RagbotError::Timeout`].
pub struct LlmClient {
    backend: Box<dyn LlmBackend>,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(config: ModelConfig) -> Self {
        let timeout = config.request_timeout();
        // Every supported provider speaks the OpenAI chat completions dialect.
        let backend: Box<dyn LlmBackend> = Box::new(OpenAiBackend::new(config));
        Self { backend, timeout }
    }

    /// Create from a pre-built backend (custom providers, tests).
    pub fn from_backend(backend: Box<dyn LlmBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> RagbotResult<LlmResponse> {
        tokio::time::timeout(self.timeout, self.backend.chat(system_prompt, messages, tools))
            .await
            .map_err(|_| {
                RagbotError::Timeout(format!(
                    "generation provider did not answer within {:?}",
                    self.timeout
                ))
            })?
    }
}
