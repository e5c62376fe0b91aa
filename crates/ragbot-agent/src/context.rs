use ragbot_core::{Message, Role};
use uuid::Uuid;

/// Per-run conversation state.
///
/// Messages are append-only. The retrieved knowledge is a single slot that
/// each retrieval replaces; when non-empty it is sent to the provider as a
/// synthesized system message ahead of the history.
pub struct ConversationState {
    conversation_id: Uuid,
    messages: Vec<Message>,
    knowledge: Option<String>,
}

impl ConversationState {
    /// Start a conversation holding only the user's message.
    pub fn new(user_input: impl Into<String>) -> Self {
        let conversation_id = Uuid::new_v4();
        Self {
            conversation_id,
            messages: vec![Message::user(user_input, conversation_id)],
            knowledge: None,
        }
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages
            .push(Message::assistant(content, self.conversation_id));
    }

    /// Append the outcome of handling a tool call.
    pub fn push_tool(&mut self, content: impl Into<String>) {
        self.messages
            .push(Message::tool(content, self.conversation_id));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn knowledge(&self) -> Option<&str> {
        self.knowledge.as_deref()
    }

    pub fn set_knowledge(&mut self, knowledge: impl Into<String>) {
        self.knowledge = Some(knowledge.into());
    }

    /// Content of the most recent user message.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Context message built from the current knowledge, if any.
    pub fn system_prompt(&self) -> Option<String> {
        self.knowledge
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|knowledge| {
                format!(
                    "You are a helpful assistant. Use the following retrieved knowledge to \
                     answer the user's question:\n\n{knowledge}\n\nIf the knowledge does not \
                     contain the answer, say so."
                )
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_user_message() {
        let state = ConversationState::new("Hello");
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, Role::User);
        assert_eq!(state.last_user_message(), Some("Hello"));
        assert!(state.system_prompt().is_none());
    }

    #[test]
    fn test_knowledge_is_replaced() {
        let mut state = ConversationState::new("q");
        state.set_knowledge("first");
        state.set_knowledge("second");
        assert_eq!(state.knowledge(), Some("second"));
        let prompt = state.system_prompt().unwrap();
        assert!(prompt.contains("\n\nsecond\n\n"));
        assert!(!prompt.contains("first"));
    }

    #[test]
    fn test_empty_knowledge_adds_no_context() {
        let mut state = ConversationState::new("q");
        state.set_knowledge("");
        assert_eq!(state.knowledge(), Some(""));
        assert!(state.system_prompt().is_none());
    }

    #[test]
    fn test_last_user_message_skips_other_roles() {
        let mut state = ConversationState::new("What is X?");
        state.push_assistant("let me look");
        state.push_tool("Unknown tool: foo");
        assert_eq!(state.last_user_message(), Some("What is X?"));
        let roles: Vec<Role> = state.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
        assert!(state
            .messages()
            .iter()
            .all(|m| m.conversation_id == state.conversation_id()));
    }
}
