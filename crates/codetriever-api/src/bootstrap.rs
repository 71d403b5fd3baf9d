//! Application bootstrap and service initialization.
//!
//! Separates service construction and dependency injection from the binary
//! entry point, mirroring the corpus's `bootstrap::initialize_app_state`
//! shape but wiring the new component boundaries: `RepoFetcher` ->
//! `ChunkingService` -> `EmbeddingClient` -> `VectorStore` feeding an
//! `Indexer`/`JobRegistry` pair, and a separate `QueryEngine` over the same
//! embedding/vector-store/chat backends.

use std::sync::Arc;

use codetriever_config::ApplicationConfig;
use codetriever_embeddings::{EmbeddingClient, HttpEmbeddingClient};
use codetriever_indexing::{Indexer, JobRegistry};
use codetriever_meta_data::{GitRepoFetcher, RepoFetcher};
use codetriever_parsing::{ChunkingService, TokenBudget};
use codetriever_search::{ChatClient, HttpChatClient, QueryEngine};
use codetriever_vector_data::{QdrantStore, VectorStore};
use tracing::info;

use crate::AppState;

/// Bootstrap result type.
pub type BootstrapResult<T> = anyhow::Result<T>;

/// Initialize vector storage (Qdrant) and ensure the collection exists.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed or the collection
/// cannot be created.
pub async fn setup_vector_store(config: &ApplicationConfig) -> BootstrapResult<Arc<dyn VectorStore>> {
    info!("Initializing vector storage...");
    let dimension = config.vector_storage.dimension as u64;
    let store = QdrantStore::connect(&config.vector_storage.url(), config.vector_storage.collection_name.clone(), dimension)?;
    store.init().await?;
    Ok(Arc::new(store) as Arc<dyn VectorStore>)
}

/// Initialize the embedding client.
#[must_use]
pub fn setup_embedding_client(config: &ApplicationConfig) -> Arc<dyn EmbeddingClient> {
    info!("Initializing embedding client...");
    Arc::new(HttpEmbeddingClient::new(config.embedding.clone())) as Arc<dyn EmbeddingClient>
}

/// Initialize the chat client backing `QueryEngine`'s answer synthesis.
#[must_use]
pub fn setup_chat_client(config: &ApplicationConfig) -> Arc<dyn ChatClient> {
    info!("Initializing chat client...");
    Arc::new(HttpChatClient::new(config.chat.clone())) as Arc<dyn ChatClient>
}

/// Initialize the repository fetcher rooted at `config.repo.storage_path`.
#[must_use]
pub fn setup_repo_fetcher(config: &ApplicationConfig) -> Arc<dyn RepoFetcher> {
    Arc::new(GitRepoFetcher::new(config.repo.storage_path.clone())) as Arc<dyn RepoFetcher>
}

/// Initialize the indexing control plane (C6/C8).
#[must_use]
pub fn setup_job_registry(
    config: &ApplicationConfig,
    fetcher: Arc<dyn RepoFetcher>,
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
) -> Arc<JobRegistry> {
    info!("Initializing indexing control plane...");
    let preparer = ChunkingService::new(TokenBudget::new(config.chunking.max_tokens, config.chunking.chars_per_token));
    let indexer = Indexer::new(
        fetcher,
        preparer,
        embedder,
        store,
        config.indexing.embed_batch,
        config.indexing.progress_interval,
    );
    Arc::new(JobRegistry::new(Arc::new(indexer)))
}

/// Initialize the RAG query pipeline (C7).
#[must_use]
pub fn setup_query_engine(
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatClient>,
) -> Arc<QueryEngine> {
    info!("Initializing query engine...");
    Arc::new(QueryEngine::new(embedder, store, chat))
}

/// Initialize all services and build the application state.
///
/// # Errors
///
/// Returns an error if vector store initialization fails.
pub async fn initialize_app_state(config: &ApplicationConfig) -> BootstrapResult<AppState> {
    let vector_store = setup_vector_store(config).await?;
    let embedding_client = setup_embedding_client(config);
    let chat_client = setup_chat_client(config);
    let repo_fetcher = setup_repo_fetcher(config);

    let registry = setup_job_registry(config, repo_fetcher, Arc::clone(&embedding_client), Arc::clone(&vector_store));
    let query_engine = setup_query_engine(embedding_client, Arc::clone(&vector_store), chat_client);

    info!("Application state initialized successfully");
    Ok(AppState::new(registry, query_engine, vector_store))
}
