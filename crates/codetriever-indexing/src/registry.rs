//! `JobRegistry` (C8): a process-wide control plane over indexing jobs.
//!
//! Modeled on the corpus's `dashmap`-based caches (e.g. the worker's
//! `StorageCache`) rather than its PostgreSQL-backed `ChunkQueue`/job-status
//! tables, since spec.md's Non-goals rule out durable cross-restart job
//! state. Live progress is published through an `RwLock` snapshot cell the
//! spawned worker task owns and replaces; map access itself is lock-free.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::indexer::{Indexer, Progress, ProgressSink, Summary};

/// A job's position in the `absent -> indexing -> {completed, failed,
/// cancelled}` state machine (spec.md §4.8). `Absent` is never stored; it is
/// the registry's answer when no entry exists for a `repo_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Indexing,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Indexing)
    }
}

/// Outcome of [`JobRegistry::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Accepted,
    AlreadyRunning,
}

/// Outcome of [`JobRegistry::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Ok,
    NotFound,
}

/// Outcome of [`JobRegistry::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Ok,
    Conflict,
    NotFound,
}

/// A job's current state as answered by [`JobRegistry::status`]. `progress`
/// is populated only while `state == JobState::Indexing`.
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub state: JobState,
    pub progress: Option<Progress>,
    pub summary: Option<Summary>,
}

/// One row of [`JobRegistry::list`].
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub repo_name: String,
    pub state: JobState,
    pub progress: Option<Progress>,
}

struct JobEntry {
    state: RwLock<JobState>,
    progress: RwLock<Progress>,
    summary: RwLock<Option<Summary>>,
    cancel: CancellationToken,
}

impl JobEntry {
    fn fresh() -> Self {
        Self {
            state: RwLock::new(JobState::Indexing),
            progress: RwLock::new(Progress::default()),
            summary: RwLock::new(None),
            cancel: CancellationToken::new(),
        }
    }

    fn state(&self) -> JobState {
        *self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn finish(&self, state: JobState, summary: Summary) {
        *self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner) = state;
        *self.summary.write().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(summary);
    }
}

/// Process-wide registry of indexing jobs keyed by `repo_name` (C8).
pub struct JobRegistry {
    jobs: DashMap<String, Arc<JobEntry>>,
    indexer: Arc<Indexer>,
}

impl JobRegistry {
    #[must_use]
    pub fn new(indexer: Arc<Indexer>) -> Self {
        Self { jobs: DashMap::new(), indexer }
    }

    /// Start indexing `repo_name` from `url`. No-op (returns
    /// [`StartOutcome::AlreadyRunning`]) if a non-terminal job already
    /// exists for that name; otherwise spawns a worker task and returns
    /// [`StartOutcome::Accepted`] immediately (P5).
    ///
    /// Uses `DashMap::entry` so the "does a non-terminal job exist" check and
    /// the insert happen under the same shard lock: two callers racing
    /// `start` for the same `repo_name` cannot both observe an absent/
    /// terminal entry and both proceed.
    pub fn start(self: &Arc<Self>, url: String, repo_name: String) -> StartOutcome {
        let entry = Arc::new(JobEntry::fresh());
        match self.jobs.entry(repo_name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if !occupied.get().state().is_terminal() {
                    return StartOutcome::AlreadyRunning;
                }
                occupied.insert(Arc::clone(&entry));
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&entry));
            }
        }

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            registry.run(url, repo_name, entry).await;
        });

        StartOutcome::Accepted
    }

    async fn run(&self, url: String, repo_name: String, entry: Arc<JobEntry>) {
        let progress_cell = Arc::clone(&entry);
        let sink: ProgressSink = Arc::new(move |progress| {
            *progress_cell.progress.write().unwrap_or_else(std::sync::PoisonError::into_inner) = progress;
        });

        let outcome = AssertUnwindSafe(self.indexer.index(&url, &repo_name, Some(sink), &entry.cancel))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(summary)) => entry.finish(JobState::Completed, summary),
            Ok(Err(crate::error::IndexError::Cancelled)) => {
                entry.finish(JobState::Cancelled, Summary { errors: vec!["cancelled".into()], ..Summary::default() });
            }
            Ok(Err(err)) => {
                entry.finish(JobState::Failed, Summary { errors: vec![err.to_string()], ..Summary::default() });
            }
            Err(_) => {
                entry.finish(
                    JobState::Failed,
                    Summary { errors: vec!["indexing worker panicked".to_string()], ..Summary::default() },
                );
            }
        }
    }

    /// Current state and (if indexing) live progress for `repo_name`.
    #[must_use]
    pub fn status(&self, repo_name: &str) -> Option<JobStatus> {
        self.jobs.get(repo_name).map(|entry| {
            let state = entry.state();
            let progress =
                (!state.is_terminal()).then(|| entry.progress.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone());
            let summary = entry.summary.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone();
            JobStatus { state, progress, summary }
        })
    }

    /// Signal cancellation of a running job. Idempotent once signaled.
    pub fn cancel(&self, repo_name: &str) -> CancelOutcome {
        match self.jobs.get(repo_name) {
            Some(entry) => {
                entry.cancel.cancel();
                CancelOutcome::Ok
            }
            None => CancelOutcome::NotFound,
        }
    }

    /// Remove a terminal job's bookkeeping. Forbidden while indexing; does
    /// not touch the vector store (purging is a separate, explicit concern).
    pub fn delete(&self, repo_name: &str) -> DeleteOutcome {
        let Some(entry) = self.jobs.get(repo_name) else {
            return DeleteOutcome::NotFound;
        };
        if !entry.state().is_terminal() {
            return DeleteOutcome::Conflict;
        }
        drop(entry);
        self.jobs.remove(repo_name);
        DeleteOutcome::Ok
    }

    /// Enumerate all known jobs with their current state.
    #[must_use]
    pub fn list(&self) -> Vec<JobSummary> {
        self.jobs
            .iter()
            .map(|row| {
                let state = row.value().state();
                let progress = (!state.is_terminal())
                    .then(|| row.value().progress.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone());
                JobSummary { repo_name: row.key().clone(), state, progress }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codetriever_embeddings::MockEmbeddingClient;
    use codetriever_meta_data::{FetchResult, RepoFetcher};
    use codetriever_parsing::ChunkingService;
    use codetriever_vector_data::MockVectorStore;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    struct EmptyFetcher;

    #[async_trait]
    impl RepoFetcher for EmptyFetcher {
        async fn fetch(&self, _url: &str, _repo_name: &str, _cancel: &CancellationToken) -> FetchResult<PathBuf> {
            Ok(PathBuf::from("/tmp/repo"))
        }
        async fn list_code_files(&self, _local_path: &Path, _cancel: &CancellationToken) -> FetchResult<Vec<PathBuf>> {
            Ok(vec![])
        }
        async fn read(&self, _file_path: &Path, _cancel: &CancellationToken) -> FetchResult<String> {
            Ok(String::new())
        }
    }

    fn registry() -> Arc<JobRegistry> {
        let indexer = Indexer::new(
            Arc::new(EmptyFetcher),
            ChunkingService::with_defaults(),
            Arc::new(MockEmbeddingClient::new(8)),
            Arc::new(MockVectorStore::new(8)),
            50,
            10,
        );
        Arc::new(JobRegistry::new(Arc::new(indexer)))
    }

    #[tokio::test]
    async fn start_twice_without_terminal_transition_is_accepted_then_already_running() {
        let registry = registry();
        let first = registry.start("https://example.com/r.git".into(), "repo".into());
        let second = registry.start("https://example.com/r.git".into(), "repo".into());
        assert_eq!(first, StartOutcome::Accepted);
        assert_eq!(second, StartOutcome::AlreadyRunning);
    }

    #[tokio::test]
    async fn status_reports_not_found_for_unknown_repo() {
        let registry = registry();
        assert!(registry.status("missing").is_none());
    }

    #[tokio::test]
    async fn delete_is_conflict_while_indexing_then_ok_once_terminal() {
        let registry = registry();
        registry.start("https://example.com/r.git".into(), "repo".into());

        // The mock fetcher/embedder/store resolve immediately, so wait for
        // the spawned task to reach a terminal state.
        for _ in 0..50 {
            if registry.status("repo").map(|s| s.state.is_terminal()) == Some(true) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let status = registry.status("repo").expect("job exists");
        assert!(status.state.is_terminal());
        assert_eq!(registry.delete("repo"), DeleteOutcome::Ok);
        assert!(registry.status("repo").is_none());
    }

    #[tokio::test]
    async fn delete_and_restart_after_terminal_is_allowed() {
        let registry = registry();
        registry.start("https://example.com/r.git".into(), "repo".into());
        for _ in 0..50 {
            if registry.status("repo").map(|s| s.state.is_terminal()) == Some(true) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(registry.delete("repo"), DeleteOutcome::Ok);
        assert_eq!(registry.start("https://example.com/r.git".into(), "repo".into()), StartOutcome::Accepted);
    }

    #[tokio::test]
    async fn cancel_unknown_job_is_not_found() {
        let registry = registry();
        assert_eq!(registry.cancel("missing"), CancelOutcome::NotFound);
    }

    #[tokio::test]
    async fn list_reflects_known_jobs() {
        let registry = registry();
        registry.start("https://example.com/r.git".into(), "repo-a".into());
        registry.start("https://example.com/r.git".into(), "repo-b".into());
        let names: Vec<_> = registry.list().into_iter().map(|j| j.repo_name).collect();
        assert!(names.contains(&"repo-a".to_string()));
        assert!(names.contains(&"repo-b".to_string()));
    }
}
