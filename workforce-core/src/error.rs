//! Error types for Workforce operations

/// Result type for Workforce operations
pub type Result<T> = std::result::Result<T, WorkforceError>;

/// Error types for the Workforce engine
#[derive(Debug, thiserror::Error)]
pub enum WorkforceError {
    /// Agent execution error
    #[error("Agent error: {0}")]
    Agent(String),

    /// Task not found in the store
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Task or message store error
    #[error("Store error: {0}")]
    Store(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Web search provider error
    #[error("Search error: {0}")]
    Search(String),

    /// Pub/sub channel error
    #[error("Pub/sub error: {0}")]
    PubSub(String),

    /// Workflow routing or execution error
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for WorkforceError {
    fn from(s: String) -> Self {
        WorkforceError::Other(s)
    }
}

impl From<&str> for WorkforceError {
    fn from(s: &str) -> Self {
        WorkforceError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for WorkforceError {
    fn from(err: anyhow::Error) -> Self {
        WorkforceError::Other(err.to_string())
    }
}
