//! Error types for [`crate::EmbeddingClient`] (C3).

use thiserror::Error;

/// Result type alias for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors raised by an embedding backend call (spec.md §7: `EmbeddingError`).
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// 4xx other than 429, auth failure, malformed request: never retried.
    #[error("request rejected: {0}")]
    InvalidRequest(String),

    /// Rate-limit, 5xx, deadline exceeded, network reset: retried with backoff.
    #[error("transient backend failure: {0}")]
    Transient(String),

    /// All retries exhausted.
    #[error("embedding backend failed after retries: {0}")]
    RetriesExhausted(String),

    /// Cancelled mid-call or mid-backoff.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<codetriever_common::Cancelled> for EmbeddingError {
    fn from(_: codetriever_common::Cancelled) -> Self {
        Self::Cancelled
    }
}
