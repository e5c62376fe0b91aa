use thiserror::Error;

/// A convenience `Result` alias using [`RagbotError`].
pub type RagbotResult<T> = Result<T, RagbotError>;

/// Top-level error type for Ragbot.
///
/// Build-time variants (`DataNotFound`, `EmbeddingProvider`) abort the index
/// build. Serve-time variants (`IndexUnavailable`, `UnknownTool`,
/// `LoopCeilingExceeded`) are recovered locally by the retrieval service and
/// the agent loop.
#[derive(Error, Debug)]
pub enum RagbotError {
    /// The document source contained nothing to index.
    #[error("No documents found: {0}")]
    DataNotFound(String),

    /// The embedding provider failed or returned malformed vectors.
    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// The persisted index is missing, corrupt, or built with another model.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// The generation provider asked for an action nobody handles.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The agent loop hit its generation-cycle ceiling.
    #[error("Agent loop exceeded maximum of {0} turns")]
    LoopCeilingExceeded(u32),

    /// An outbound HTTP request failed (generation or embedding API call).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider call did not finish within its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The caller abandoned the request.
    #[error("Cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
