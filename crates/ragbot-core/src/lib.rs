//! Core types and error definitions for Ragbot.
//!
//! This crate provides the foundational types shared by the indexing, retrieval
//! and agent crates: error handling, conversation messages and tool call
//! abstractions.
//!
//! # Main types
//!
//! - [`RagbotError`]: Unified error enum for all Ragbot subsystems.
//! - [`RagbotResult`]: Convenience alias for `Result<T, RagbotError>`.
//! - [`Role`]: Message role (user, assistant, system, tool).
//! - [`Message`]: A single message within a conversation.
//! - [`ToolCall`]: A tool invocation request emitted by the generation provider.
//! - [`ToolDescriptor`]: An action advertised to the generation provider.

/// Error taxonomy.
pub mod error;
/// Conversation messages.
pub mod message;
/// Tool invocation types.
pub mod tool;

pub use error::{RagbotError, RagbotResult};
pub use message::{Message, Role};
pub use tool::{ToolCall, ToolDescriptor};
