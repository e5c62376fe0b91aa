use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of the participant that authored a [`Message`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human end-user.
    User,
    /// The AI assistant.
    Assistant,
    /// Synthesized context (e.g. retrieved knowledge).
    System,
    /// Output produced while handling a tool invocation.
    Tool,
}

/// A single message exchanged within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    pub id: Uuid,
    /// The role of the message author.
    pub role: Role,
    /// The textual content of the message.
    pub content: String,
    /// The conversation this message belongs to.
    pub conversation_id: Uuid,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with the given role, content, and conversation ID.
    pub fn new(role: Role, content: impl Into<String>, conversation_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            conversation_id,
            timestamp: Utc::now(),
        }
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>, conversation_id: Uuid) -> Self {
        Self::new(Role::User, content, conversation_id)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>, conversation_id: Uuid) -> Self {
        Self::new(Role::Assistant, content, conversation_id)
    }

    /// Creates a new message with [`Role::Tool`].
    pub fn tool(content: impl Into<String>, conversation_id: Uuid) -> Self {
        Self::new(Role::Tool, content, conversation_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let conversation_id = Uuid::new_v4();
        let msg = Message::user("Hello", conversation_id);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.conversation_id, conversation_id);
    }

    #[test]
    fn test_tool_message_role() {
        let msg = Message::tool("Unknown tool: web_search", Uuid::new_v4());
        assert_eq!(msg.role, Role::Tool);
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("test", Uuid::new_v4());
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "test");
        assert_eq!(deserialized.role, Role::User);
    }
}
