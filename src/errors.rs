//! Error types for the docuchat service core
//!
//! Provides the error taxonomy shared by the orchestrator, the stores and
//! the ingestion pipeline, with context propagation via `thiserror`.

use thiserror::Error;

/// Main error type for the document-chat service
#[derive(Error, Debug)]
pub enum ChatError {
    /// Missing/invalid environment credentials or an unsupported provider.
    /// Fatal, surfaced to the caller immediately, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed input (empty document set with no fallback, bad request
    /// payload). Fatal for the current request only.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conversation or thread absent (or soft-deleted).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A routing value that is neither "retrieve" nor "direct" reached the
    /// routing decision. Unreachable given the classifier's constrained
    /// output; kept as a hard error for corrupted or forced state.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// Generation or vector-store capability failure. Propagated as-is;
    /// retries belong to the capability's own client configuration.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Relational store errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChatError::Configuration("QDRANT_URL is not set".to_string());
        assert!(err.to_string().contains("QDRANT_URL"));

        let err = ChatError::InvalidRoute("summarize".to_string());
        assert!(err.to_string().contains("summarize"));
    }

    #[test]
    fn test_not_found_display() {
        let err = ChatError::NotFound("thread abc-123".to_string());
        assert!(err.to_string().starts_with("Not found"));
    }
}
