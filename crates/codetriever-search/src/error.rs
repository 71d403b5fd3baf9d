//! Error types for [`crate::QueryEngine`] (C7).

use thiserror::Error;

/// Result type alias for query operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors raised answering a question (spec.md §7: `QueryEngine` surfaces
/// cancellation unwrapped; embedding/vector-store/chat failures degrade to
/// a best-effort answer rather than propagating, per §4.7 step 6).
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] codetriever_embeddings::EmbeddingError),

    #[error("vector store failed: {0}")]
    VectorStore(#[from] codetriever_vector_data::VectorDataError),

    #[error("chat backend failed: {0}")]
    Chat(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<codetriever_common::Cancelled> for SearchError {
    fn from(_: codetriever_common::Cancelled) -> Self {
        Self::Cancelled
    }
}
