//! Error types for the `VectorStore` facade (C4).

use thiserror::Error;

/// Result type alias for vector store operations.
pub type VectorDataResult<T> = Result<T, VectorDataError>;

/// Errors raised by [`crate::VectorStore`] (spec.md §7: `VectorStoreError`).
#[derive(Error, Debug)]
pub enum VectorDataError {
    /// `vector.len() != D` on upsert or search. Never round-trips to the backend.
    #[error("invalid vector: {0}")]
    InvalidVector(String),

    /// `limit == 0`, or any other precondition violation caught before the call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport/backend failure, after retries on upsert, or immediately on search.
    #[error("storage error: {0}")]
    Storage(String),

    /// The indexing job (or caller) was cancelled mid-operation.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<codetriever_common::Cancelled> for VectorDataError {
    fn from(_: codetriever_common::Cancelled) -> Self {
        Self::Cancelled
    }
}
