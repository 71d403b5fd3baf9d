//! Application state for Axum handlers.
//!
//! Holds the process-wide singletons the control plane and query endpoint
//! share: the [`JobRegistry`](codetriever_indexing::JobRegistry), the
//! [`QueryEngine`](codetriever_search::QueryEngine), and the
//! [`VectorStore`](codetriever_vector_data::VectorStore) handle `delete`
//! uses to purge a repository's points.

use std::sync::Arc;

use codetriever_indexing::JobRegistry;
use codetriever_search::QueryEngine;
use codetriever_vector_data::VectorStore;

/// Shared resources passed to every Axum handler via dependency injection.
#[derive(Clone)]
pub struct AppState {
    /// Control plane (C8): start/status/cancel/delete/list per repo name.
    pub registry: Arc<JobRegistry>,
    /// RAG query pipeline (C7).
    pub query_engine: Arc<QueryEngine>,
    /// Vector store handle, used directly by `delete` to purge a
    /// repository's points once its job record is removed (spec.md §9
    /// open question 1).
    pub vector_store: Arc<dyn VectorStore>,
}

impl AppState {
    #[must_use]
    pub fn new(
        registry: Arc<JobRegistry>,
        query_engine: Arc<QueryEngine>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self { registry, query_engine, vector_store }
    }
}
