use ragbot_core::ToolDescriptor;

/// Name of the knowledge retrieval action.
pub const RETRIEVE_KNOWLEDGE: &str = "retrieve_knowledge";

/// The retrieval action as advertised to the generation provider.
pub fn retrieval_tool() -> ToolDescriptor {
    ToolDescriptor {
        name: RETRIEVE_KNOWLEDGE.to_string(),
        description: "Retrieves relevant information from the knowledge base based on the \
                      user's query. Use this tool when the user asks a question that might be \
                      answered by the knowledge base."
            .to_string(),
        parameters_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look up in the knowledge base."
                }
            },
            "required": ["query"]
        }),
    }
}
