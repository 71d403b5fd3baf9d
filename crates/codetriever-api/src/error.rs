//! Error handling for the codetriever HTTP API.
//!
//! This module provides a single `Error` type that wraps the errors of the
//! components it orchestrates (`codetriever-indexing`, `codetriever-search`,
//! `codetriever-vector-data`, `codetriever-config`) and maps them onto HTTP
//! status codes (spec.md §7).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The API's error type. Each variant maps to a specific HTTP status in
/// `IntoResponse` below.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("repository '{0}' is already indexing")]
    AlreadyRunning(String),

    #[error("no job found for repository '{0}'")]
    NotFound(String),

    #[error("repository '{0}' is still indexing")]
    Conflict(String),

    #[error("indexing failed: {0}")]
    Indexing(#[from] codetriever_indexing::IndexError),

    #[error("query failed: {0}")]
    Search(#[from] codetriever_search::SearchError),

    #[error("configuration error: {0}")]
    Config(#[from] codetriever_config::ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized `Result` type for codetriever API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyRunning(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Indexing(codetriever_indexing::IndexError::InvalidArgument(_))
            | Self::Search(codetriever_search::SearchError::InvalidArgument(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Indexing(_) | Self::Search(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        tracing::error!(%self, "request failed");
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
