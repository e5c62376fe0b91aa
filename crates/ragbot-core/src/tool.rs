use serde::{Deserialize, Serialize};

/// A request from the generation provider to invoke a named action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier assigned by the provider for this call.
    pub id: String,
    /// Name of the action to invoke.
    pub name: String,
    /// JSON arguments for the action.
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Returns a non-empty string argument, if the provider supplied one.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// An action advertised to the generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON schema of the action's arguments.
    pub parameters_schema: serde_json::Value,
}
