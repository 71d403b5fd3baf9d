//! Error types for indexing orchestration: the [`crate::Indexer`] (C6) and
//! [`crate::JobRegistry`] (C8).

use thiserror::Error;

/// Result type alias for indexing operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors raised running an indexing job (spec.md §7).
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("repository fetch failed: {0}")]
    Fetch(codetriever_meta_data::FetchError),

    #[error("embedding failed: {0}")]
    Embedding(codetriever_embeddings::EmbeddingError),

    #[error("vector store failed: {0}")]
    VectorStore(codetriever_vector_data::VectorDataError),

    /// A batch of embed+upsert work failed partway through; points upserted
    /// by earlier batches are not rolled back.
    #[error("batch starting at index {batch_start} failed: {source}")]
    BatchFailed { batch_start: usize, #[source] source: Box<IndexError> },

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<codetriever_common::Cancelled> for IndexError {
    fn from(_: codetriever_common::Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<codetriever_meta_data::FetchError> for IndexError {
    fn from(err: codetriever_meta_data::FetchError) -> Self {
        match err {
            codetriever_meta_data::FetchError::Cancelled => Self::Cancelled,
            other => Self::Fetch(other),
        }
    }
}

impl From<codetriever_embeddings::EmbeddingError> for IndexError {
    fn from(err: codetriever_embeddings::EmbeddingError) -> Self {
        match err {
            codetriever_embeddings::EmbeddingError::Cancelled => Self::Cancelled,
            other => Self::Embedding(other),
        }
    }
}

impl From<codetriever_vector_data::VectorDataError> for IndexError {
    fn from(err: codetriever_vector_data::VectorDataError) -> Self {
        match err {
            codetriever_vector_data::VectorDataError::Cancelled => Self::Cancelled,
            other => Self::VectorStore(other),
        }
    }
}
