use thiserror::Error;

/// Top-level error type for the weft framework.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, Error)]
pub enum WeftError {
    /// An error from an LLM provider call (HTTP failure, malformed
    /// completion, exhausted retries, stream corruption).
    #[error("LLM error: {0}")]
    Llm(String),

    /// An error originating from the agent execution loop.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error raised by a tool during invocation.
    #[error("Tool error: {0}")]
    Tool(String),

    /// An error from the history compaction layer.
    #[error("Memory error: {0}")]
    Memory(String),

    /// An error from the workflow scheduler.
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// An error related to conversation persistence or lookup.
    #[error("Session error: {0}")]
    Session(String),

    /// An error in configuration parsing or validation. Fatal at
    /// construction time, never retried.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`WeftError`].
pub type WeftResult<T> = Result<T, WeftError>;
