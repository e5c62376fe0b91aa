//! Retrieval-augmented agent loop for Ragbot.
//!
//! [`AgentRunner`] drives a generation provider through [`LlmClient`],
//! consulting a [`ragbot_memory::RetrievalService`] whenever the provider
//! requests the `retrieve_knowledge` action.

pub mod backends;
pub mod config;
pub mod context;
pub mod llm;
pub mod runner;
pub mod tool;

pub use backends::LlmBackend;
pub use config::{LlmProvider, ModelConfig, API_KEY_ENV};
pub use context::ConversationState;
pub use llm::{LlmClient, LlmResponse};
pub use runner::{AgentOutcome, AgentRunner, StopReason, FALLBACK_RESPONSE, RETRIEVAL_FAILED};
pub use tool::{retrieval_tool, RETRIEVE_KNOWLEDGE};
