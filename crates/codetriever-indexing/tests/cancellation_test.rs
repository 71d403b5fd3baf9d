//! Integration coverage for job cancellation (P8) and the registry's
//! start/status/cancel/delete lifecycle (spec.md §4.8, R3).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codetriever_embeddings::MockEmbeddingClient;
use codetriever_indexing::{CancelOutcome, DeleteOutcome, Indexer, JobRegistry, JobState, StartOutcome};
use codetriever_meta_data::{FetchError, FetchResult, RepoFetcher};
use codetriever_parsing::ChunkingService;
use codetriever_vector_data::MockVectorStore;
use tokio_util::sync::CancellationToken;

/// A fetcher that enumerates many files, each taking a moment to "read",
/// so a cancel signal lands mid-enumeration rather than before it starts.
struct SlowFetcher {
    file_count: usize,
}

#[async_trait]
impl RepoFetcher for SlowFetcher {
    async fn fetch(&self, _url: &str, _repo_name: &str, _cancel: &CancellationToken) -> FetchResult<PathBuf> {
        Ok(PathBuf::from("/tmp/slow-repo"))
    }

    async fn list_code_files(&self, _local_path: &Path, _cancel: &CancellationToken) -> FetchResult<Vec<PathBuf>> {
        Ok((0..self.file_count).map(|i| PathBuf::from(format!("file{i}.rs"))).collect())
    }

    async fn read(&self, _file_path: &Path, _cancel: &CancellationToken) -> FetchResult<String> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok("fn f() {}".to_string())
    }
}

struct FailingFetcher;

#[async_trait]
impl RepoFetcher for FailingFetcher {
    async fn fetch(&self, _url: &str, _repo_name: &str, _cancel: &CancellationToken) -> FetchResult<PathBuf> {
        Err(FetchError::InvalidArgument("no such remote".into()))
    }

    async fn list_code_files(&self, _local_path: &Path, _cancel: &CancellationToken) -> FetchResult<Vec<PathBuf>> {
        Ok(vec![])
    }

    async fn read(&self, _file_path: &Path, _cancel: &CancellationToken) -> FetchResult<String> {
        Ok(String::new())
    }
}

fn registry_with(fetcher: impl RepoFetcher + 'static) -> Arc<JobRegistry> {
    let indexer = Indexer::new(
        Arc::new(fetcher),
        ChunkingService::with_defaults(),
        Arc::new(MockEmbeddingClient::new(8)),
        Arc::new(MockVectorStore::new(8)),
        50,
        10,
    );
    Arc::new(JobRegistry::new(Arc::new(indexer)))
}

async fn wait_for_terminal(registry: &JobRegistry, repo_name: &str) -> JobState {
    for _ in 0..200 {
        if let Some(status) = registry.status(repo_name) {
            if status.state.is_terminal() {
                return status.state;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never reached a terminal state");
}

#[tokio::test]
async fn cancelling_a_running_job_transitions_to_cancelled() {
    let registry = registry_with(SlowFetcher { file_count: 50 });
    assert_eq!(registry.start("https://example.com/r.git".into(), "slow-repo".into()), StartOutcome::Accepted);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(registry.cancel("slow-repo"), CancelOutcome::Ok);

    let state = wait_for_terminal(&registry, "slow-repo").await;
    assert_eq!(state, JobState::Cancelled);
}

#[tokio::test]
async fn fetch_failure_transitions_job_to_failed_with_recorded_error() {
    let registry = registry_with(FailingFetcher);
    registry.start("https://example.com/r.git".into(), "broken-repo".into());

    let state = wait_for_terminal(&registry, "broken-repo").await;
    assert_eq!(state, JobState::Failed);

    let status = registry.status("broken-repo").expect("job recorded");
    let summary = status.summary.expect("terminal job carries a summary");
    assert!(!summary.errors.is_empty());
}

#[tokio::test]
async fn delete_then_restart_is_allowed_but_not_while_indexing() {
    let registry = registry_with(SlowFetcher { file_count: 5 });
    registry.start("https://example.com/r.git".into(), "repo".into());

    assert_eq!(registry.delete("repo"), DeleteOutcome::Conflict);

    wait_for_terminal(&registry, "repo").await;
    assert_eq!(registry.delete("repo"), DeleteOutcome::Ok);
    assert_eq!(registry.start("https://example.com/r.git".into(), "repo".into()), StartOutcome::Accepted);
}
