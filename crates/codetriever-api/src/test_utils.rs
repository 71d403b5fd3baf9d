//! Shared helpers for building an [`AppState`] backed entirely by mocks, for
//! route-level handler tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use codetriever_embeddings::MockEmbeddingClient;
use codetriever_indexing::{Indexer, JobRegistry};
use codetriever_meta_data::{FetchResult, RepoFetcher};
use codetriever_parsing::ChunkingService;
use codetriever_search::{MockChatClient, QueryEngine};
use codetriever_vector_data::MockVectorStore;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

const TEST_DIM: usize = 8;

struct EmptyFetcher;

#[async_trait]
impl RepoFetcher for EmptyFetcher {
    async fn fetch(&self, _url: &str, _repo_name: &str, _cancel: &CancellationToken) -> FetchResult<PathBuf> {
        Ok(PathBuf::from("/tmp/empty-repo"))
    }
    async fn list_code_files(&self, _local_path: &Path, _cancel: &CancellationToken) -> FetchResult<Vec<PathBuf>> {
        Ok(vec![])
    }
    async fn read(&self, _file_path: &Path, _cancel: &CancellationToken) -> FetchResult<String> {
        Ok(String::new())
    }
}

/// Build an [`AppState`] whose indexer, embedder, vector store, and chat
/// client are all in-memory mocks, suitable for exercising route handlers
/// without any network or filesystem access.
#[must_use]
pub fn test_state() -> AppState {
    let store = Arc::new(MockVectorStore::new(TEST_DIM));
    let embedder = Arc::new(MockEmbeddingClient::new(TEST_DIM));

    let indexer = Indexer::new(
        Arc::new(EmptyFetcher),
        ChunkingService::with_defaults(),
        embedder.clone(),
        store.clone(),
        50,
        10,
    );
    let registry = Arc::new(JobRegistry::new(Arc::new(indexer)));

    let query_engine =
        Arc::new(QueryEngine::new(embedder, store.clone(), Arc::new(MockChatClient::echoing("mock answer"))));

    AppState::new(registry, query_engine, store)
}
