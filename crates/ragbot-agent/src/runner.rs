use crate::config::ModelConfig;
use crate::context::ConversationState;
use crate::llm::{LlmClient, LlmResponse};
use crate::tool::{retrieval_tool, RETRIEVE_KNOWLEDGE};
use ragbot_core::{RagbotError, RagbotResult, ToolCall, ToolDescriptor};
use ragbot_memory::RetrievalService;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Returned whenever a run ends without a usable answer.
pub const FALLBACK_RESPONSE: &str = "Sorry, I could not generate a response.";

/// Tool-result text used when retrieval fails mid-run.
pub const RETRIEVAL_FAILED: &str =
    "An error occurred while retrieving information from the knowledge base.";

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The provider produced a final answer.
    Answered,
    /// The generation ceiling was hit.
    CeilingExceeded,
    /// The provider failed or timed out.
    ProviderFailed,
    Cancelled,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub text: String,
    pub stop_reason: StopReason,
    /// Provider calls made.
    pub generations: u32,
    pub retrievals: u32,
    /// Query used by each retrieval, in order.
    pub queries: Vec<String>,
}

enum LoopState {
    Generating,
    Retrieving(ToolCall),
    Done(String, StopReason),
}

/// The agent runner: orchestrates one conversation per call.
///
/// Prompt → provider → (retrieve → fold knowledge back → provider)* → answer.
/// Runs share nothing but the read-only [`RetrievalService`], so one runner
/// can serve many concurrent requests.
pub struct AgentRunner {
    llm: LlmClient,
    retrieval: RetrievalService,
    tools: Vec<ToolDescriptor>,
    max_turns: u32,
    top_k: usize,
}

impl AgentRunner {
    pub fn new(config: ModelConfig, retrieval: RetrievalService) -> Self {
        let max_turns = config.max_turns;
        let top_k = config.retrieval_top_k;
        Self::from_client(LlmClient::new(config), retrieval)
            .with_max_turns(max_turns)
            .with_top_k(top_k)
    }

    /// Build around an existing client with default limits (10 turns, k = 3).
    pub fn from_client(llm: LlmClient, retrieval: RetrievalService) -> Self {
        Self {
            llm,
            retrieval,
            tools: vec![retrieval_tool()],
            max_turns: 10,
            top_k: 3,
        }
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    /// Answer `user_input`. Failures end in [`FALLBACK_RESPONSE`], never an error.
    pub async fn run(&self, user_input: &str) -> String {
        self.run_detailed(user_input).await.text
    }

    pub async fn run_detailed(&self, user_input: &str) -> AgentOutcome {
        self.run_with_cancel(user_input, &CancellationToken::new())
            .await
    }

    /// Run until done or until `cancel` fires. Cancellation is observed
    /// before every provider call and aborts one that is in flight.
    pub async fn run_with_cancel(&self, user_input: &str, cancel: &CancellationToken) -> AgentOutcome {
        let mut state = ConversationState::new(user_input);
        let conversation_id = state.conversation_id();
        let mut generations = 0u32;
        let mut retrievals = 0u32;
        let mut queries = Vec::new();
        let mut next = LoopState::Generating;

        info!(conversation_id = %conversation_id, "Starting agent loop");

        let (text, stop_reason) = loop {
            next = match next {
                LoopState::Done(text, reason) => break (text, reason),

                LoopState::Generating => {
                    if cancel.is_cancelled() {
                        LoopState::Done(FALLBACK_RESPONSE.to_string(), StopReason::Cancelled)
                    } else if generations >= self.max_turns {
                        let err = RagbotError::LoopCeilingExceeded(self.max_turns);
                        warn!(conversation_id = %conversation_id, error = %err, "Returning fallback");
                        LoopState::Done(FALLBACK_RESPONSE.to_string(), StopReason::CeilingExceeded)
                    } else {
                        generations += 1;
                        debug!(conversation_id = %conversation_id, turn = generations, "Generating");
                        self.generate(&mut state, cancel).await
                    }
                }

                LoopState::Retrieving(call) => {
                    if call.name != RETRIEVE_KNOWLEDGE {
                        let err = RagbotError::UnknownTool(call.name.clone());
                        warn!(conversation_id = %conversation_id, call_id = %call.id, tool = %call.name, "Unknown tool requested");
                        state.push_tool(err.to_string());
                        LoopState::Generating
                    } else {
                        let query = call
                            .str_arg("query")
                            .or_else(|| state.last_user_message())
                            .unwrap_or_default()
                            .to_string();
                        retrievals += 1;
                        queries.push(query.clone());

                        match self.retrieve(&query, cancel).await {
                            Ok(knowledge) => {
                                debug!(
                                    conversation_id = %conversation_id,
                                    query = %query,
                                    chars = knowledge.len(),
                                    "Knowledge retrieved"
                                );
                                state.set_knowledge(knowledge);
                                LoopState::Generating
                            }
                            Err(RagbotError::Cancelled) => LoopState::Done(
                                FALLBACK_RESPONSE.to_string(),
                                StopReason::Cancelled,
                            ),
                            Err(e) => {
                                error!(conversation_id = %conversation_id, error = %e, "Error during knowledge retrieval");
                                state.push_tool(RETRIEVAL_FAILED);
                                LoopState::Generating
                            }
                        }
                    }
                }
            };
        };

        info!(
            conversation_id = %conversation_id,
            generations,
            retrievals,
            stop_reason = ?stop_reason,
            "Agent loop finished"
        );

        AgentOutcome {
            text,
            stop_reason,
            generations,
            retrievals,
            queries,
        }
    }

    async fn generate(&self, state: &mut ConversationState, cancel: &CancellationToken) -> LoopState {
        let system_prompt = state.system_prompt();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RagbotError::Cancelled),
            response = self.llm.chat(system_prompt.as_deref(), state.messages(), &self.tools) => response,
        };

        match response {
            Ok(LlmResponse::Text(text)) => {
                state.push_assistant(text.clone());
                LoopState::Done(text, StopReason::Answered)
            }
            Ok(LlmResponse::ToolUse {
                content,
                tool_calls,
            }) => {
                if let Some(text) = &content {
                    state.push_assistant(text.clone());
                }
                let discarded = tool_calls.len().saturating_sub(1);
                match tool_calls.into_iter().next() {
                    Some(call) => {
                        if discarded > 0 {
                            debug!(discarded, "Only the first tool call of a turn is handled");
                        }
                        LoopState::Retrieving(call)
                    }
                    None => LoopState::Done(content.unwrap_or_default(), StopReason::Answered),
                }
            }
            Err(RagbotError::Cancelled) => {
                LoopState::Done(FALLBACK_RESPONSE.to_string(), StopReason::Cancelled)
            }
            Err(e) => {
                error!(error = %e, "Generation provider failed");
                LoopState::Done(FALLBACK_RESPONSE.to_string(), StopReason::ProviderFailed)
            }
        }
    }

    async fn retrieve(&self, query: &str, cancel: &CancellationToken) -> RagbotResult<String> {
        let timeout = self.llm.timeout();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RagbotError::Cancelled),
            result = tokio::time::timeout(timeout, self.retrieval.retrieve(query, self.top_k)) => {
                result.map_err(|_| RagbotError::Timeout(format!("retrieval did not finish within {timeout:?}")))?
            }
        }
    }
}
