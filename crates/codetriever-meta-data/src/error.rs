//! Error types for [`crate::RepoFetcher`] (C5).

use thiserror::Error;

/// Result type alias for repository fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors raised acquiring or reading a repository (spec.md §7: `FetchError`,
/// fatal to the indexing job that triggered it).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<codetriever_common::Cancelled> for FetchError {
    fn from(_: codetriever_common::Cancelled) -> Self {
        Self::Cancelled
    }
}
