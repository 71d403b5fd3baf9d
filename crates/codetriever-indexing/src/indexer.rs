//! `Indexer` (C6): orchestrates `RepoFetcher` -> Chunker -> `TextPreparer` ->
//! `EmbeddingClient` -> `VectorStore` for a single repository.
//!
//! Grounded on the corpus's `codetriever-indexing::worker::BackgroundWorker`
//! (parse -> embed -> store stages, progress counters, per-file error
//! recovery) generalized to the crate boundaries this workspace now draws:
//! fetch/parse/prepare/embed/store each live in their own crate behind a
//! narrow trait, and the PostgreSQL-backed durable queue the corpus worker
//! used is dropped per spec.md's Non-goals (no durable job-state
//! persistence) in favor of a single in-process async task per job.

use std::sync::Arc;
use std::time::{Duration, Instant};

use codetriever_common::piece_id;
use codetriever_embeddings::EmbeddingClient;
use codetriever_meta_data::RepoFetcher;
use codetriever_parsing::{ChunkingService, CodeChunk, CodeParser, ContentParser};
use codetriever_vector_data::{Payload, PayloadValue, VectorStore};
use tokio_util::sync::CancellationToken;

use crate::error::{IndexError, IndexResult};

/// Files between `Progress` snapshots during enumeration (spec.md §4.6).
pub const PROGRESS_INTERVAL: usize = 10;
/// Chunks-per-slice for the embed+upsert phase (spec.md §4.6).
pub const EMBED_BATCH: usize = 50;

/// A live snapshot of an in-flight indexing job's counters.
///
/// Counters are monotonically non-decreasing within a single job (P7).
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub total_files: usize,
    pub processed_files: usize,
    pub total_chunks: usize,
    pub current_file: Option<String>,
    pub errors: Vec<String>,
}

/// The terminal report for a completed, failed, or cancelled indexing job.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub files_processed: usize,
    pub chunks_indexed: usize,
    pub duration: Duration,
    pub errors: Vec<String>,
}

/// Callback invoked with a [`Progress`] snapshot at each stable emission point.
pub type ProgressSink = Arc<dyn Fn(Progress) + Send + Sync>;

fn emit(sink: Option<&ProgressSink>, progress: &Progress) {
    if let Some(sink) = sink {
        sink(progress.clone());
    }
}

struct PreparedPiece {
    id: String,
    text: String,
    chunk: CodeChunk,
}

fn build_payload(chunk: &CodeChunk, repo_name: &str) -> Payload {
    let mut payload: Payload = Payload::new();
    payload.insert("kind".to_string(), PayloadValue::from(chunk.kind.as_str()));
    payload.insert("qualified_name".to_string(), PayloadValue::from(chunk.qualified_name.clone()));
    if let Some(parent) = &chunk.parent_qualified_name {
        payload.insert("parent_qualified_name".to_string(), PayloadValue::from(parent.clone()));
    }
    if let Some(namespace) = &chunk.namespace {
        payload.insert("namespace".to_string(), PayloadValue::from(namespace.clone()));
    }
    payload.insert("file_path".to_string(), PayloadValue::from(chunk.file_path.clone()));
    payload.insert("start_line".to_string(), PayloadValue::from(chunk.start_line));
    payload.insert("end_line".to_string(), PayloadValue::from(chunk.end_line));
    payload.insert("content".to_string(), PayloadValue::from(chunk.content.clone()));
    payload.insert("repo_name".to_string(), PayloadValue::from(repo_name));
    payload
}

/// Orchestrates a single repository's indexing pipeline (C6).
pub struct Indexer {
    fetcher: Arc<dyn RepoFetcher>,
    parser: CodeParser,
    preparer: ChunkingService,
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    embed_batch: usize,
    progress_interval: usize,
}

impl Indexer {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn RepoFetcher>,
        preparer: ChunkingService,
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        embed_batch: usize,
        progress_interval: usize,
    ) -> Self {
        Self {
            fetcher,
            parser: CodeParser::new(),
            preparer,
            embedder,
            store,
            embed_batch: embed_batch.max(1),
            progress_interval: progress_interval.max(1),
        }
    }

    /// Run the full fetch -> chunk -> prepare -> embed -> upsert pipeline for
    /// `repo_name`, emitting [`Progress`] snapshots through `progress_sink`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidArgument`] for blank `url`/`repo_name`,
    /// propagates fetch/embedding/vector-store failures as fatal, and
    /// returns [`IndexError::Cancelled`] if `cancel` fires.
    pub async fn index(
        &self,
        url: &str,
        repo_name: &str,
        progress_sink: Option<ProgressSink>,
        cancel: &CancellationToken,
    ) -> IndexResult<Summary> {
        if url.trim().is_empty() || repo_name.trim().is_empty() {
            return Err(IndexError::InvalidArgument("url and repo_name must not be blank".into()));
        }

        let started = Instant::now();
        let mut progress = Progress::default();

        let local_path = self.fetcher.fetch(url, repo_name, cancel).await?;
        emit(progress_sink.as_ref(), &progress);

        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }

        let files = self.fetcher.list_code_files(&local_path, cancel).await?;
        progress.total_files = files.len();
        emit(progress_sink.as_ref(), &progress);

        let mut pending: Vec<PreparedPiece> = Vec::new();

        for (index, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }

            let relative = file.to_string_lossy().into_owned();
            progress.current_file = Some(relative.clone());

            match self.fetcher.read(file, cancel).await {
                Ok(content) => match self.parser.parse(&relative, &content) {
                    Ok(chunks) => {
                        progress.total_chunks += chunks.len();
                        for chunk in chunks {
                            let spans = self.preparer.prepare(&chunk);
                            let single = spans.len() == 1;
                            for span in spans {
                                let id = if single {
                                    chunk.id.clone()
                                } else {
                                    piece_id(&chunk.id, span.ordinal)
                                };
                                pending.push(PreparedPiece { id, text: span.text, chunk: chunk.clone() });
                            }
                        }
                    }
                    Err(e) => progress.errors.push(format!("{relative}: {e}")),
                },
                Err(e) => progress.errors.push(format!("{relative}: {e}")),
            }

            progress.processed_files = index + 1;
            if progress.processed_files % self.progress_interval == 0
                || progress.processed_files == progress.total_files
            {
                emit(progress_sink.as_ref(), &progress);
            }
        }

        let mut points_indexed = 0usize;

        for (batch_index, batch) in pending.chunks(self.embed_batch).enumerate() {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }
            let batch_start = batch_index * self.embed_batch;

            let texts: Vec<String> = batch.iter().map(|piece| piece.text.clone()).collect();
            let vectors = self.embedder.embed(&texts, cancel).await.map_err(|e| {
                let mapped = IndexError::from(e);
                if matches!(mapped, IndexError::Cancelled) {
                    mapped
                } else {
                    IndexError::BatchFailed { batch_start, source: Box::new(mapped) }
                }
            })?;

            let upserts = batch.iter().zip(vectors).map(|(piece, vector)| {
                let id = piece.id.clone();
                let payload = build_payload(&piece.chunk, repo_name);
                async move { self.store.upsert(&id, vector, payload, cancel).await }
            });

            for result in futures::future::join_all(upserts).await {
                result.map_err(|e| {
                    let mapped = IndexError::from(e);
                    if matches!(mapped, IndexError::Cancelled) {
                        mapped
                    } else {
                        IndexError::BatchFailed { batch_start, source: Box::new(mapped) }
                    }
                })?;
            }

            points_indexed += batch.len();
        }

        Ok(Summary {
            files_processed: progress.processed_files,
            chunks_indexed: points_indexed,
            duration: started.elapsed(),
            errors: progress.errors,
        })
    }
}
