use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChesterError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conversation has been deleted")]
    ConversationClosed,
}

impl ChesterError {
    /// True for failures reported by the completion service, including timeouts.
    pub fn is_completion_failure(&self) -> bool {
        matches!(
            self,
            ChesterError::Completion(_) | ChesterError::Timeout(_) | ChesterError::Network(_)
        )
    }
}

impl From<serde_json::Error> for ChesterError {
    fn from(e: serde_json::Error) -> Self {
        ChesterError::Serialization(e.to_string())
    }
}
