//! `RepoFetcher` (C5): acquire/update a local repository clone and enumerate
//! its code files.
//!
//! Grounded on `codetriever-meta-data/src/git.rs`'s git2 usage (the corpus
//! only detects an already-checked-out repository's context; this
//! generalizes it to clone-or-pull acquisition per spec.md §4.5, since the
//! corpus never implements acquisition itself).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use git2::Repository;
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, FetchResult};

/// Extensions recognized as source code (spec.md §4.5's closed allow-list).
const ALLOWED_EXTENSIONS: &[&str] = &[
    "cs", "java", "py", "js", "ts", "go", "cpp", "c", "h", "hpp", "php", "rb", "rs", "kt", "scala",
    "swift", "dart", "vue", "jsx", "tsx",
];

/// Directory names never descended into (spec.md §4.5's closed deny-list).
const DENIED_DIRS: &[&str] = &[
    "node_modules",
    "bin",
    "obj",
    ".git",
    "packages",
    "target",
    "build",
    "dist",
    ".next",
    ".nuxt",
    "vendor",
    "__pycache__",
    ".pytest_cache",
    "coverage",
    ".coverage",
    ".nyc_output",
    "bower_components",
];

/// Narrow capability interface over repository acquisition (C5).
#[async_trait]
pub trait RepoFetcher: Send + Sync {
    /// Clone `url` into `storage_path/sanitize(repo_name)` if absent, or
    /// fast-forward an existing clone to its remote tracking branch.
    /// Returns the local working directory. A clone/fetch in progress is
    /// aborted if `cancel` fires before it completes.
    async fn fetch(&self, url: &str, repo_name: &str, cancel: &CancellationToken) -> FetchResult<PathBuf>;

    /// Recursively enumerate code files under `local_path`, applying the
    /// extension allow-list and directory deny-list.
    async fn list_code_files(&self, local_path: &Path, cancel: &CancellationToken) -> FetchResult<Vec<PathBuf>>;

    /// Read a file's contents as UTF-8, recovering lossily from any
    /// non-UTF-8 bytes rather than failing the whole file.
    async fn read(&self, file_path: &Path, cancel: &CancellationToken) -> FetchResult<String>;
}

/// git2-backed [`RepoFetcher`] rooted at a configurable base directory.
pub struct GitRepoFetcher {
    base_dir: PathBuf,
}

impl GitRepoFetcher {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn local_path(&self, repo_name: &str) -> PathBuf {
        self.base_dir.join(codetriever_common::sanitize_repo_name(repo_name))
    }
}

fn fetch_options(aborted: &Arc<AtomicBool>) -> git2::FetchOptions<'_> {
    let aborted = Arc::clone(aborted);
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.transfer_progress(move |_progress| !aborted.load(Ordering::SeqCst));
    let mut options = git2::FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

fn clone_or_update(url: &str, path: &Path, aborted: &Arc<AtomicBool>) -> Result<(), git2::Error> {
    if path.join(".git").is_dir() {
        update_existing(path, aborted)
    } else {
        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_options(aborted));
        builder.clone(url, path)?;
        Ok(())
    }
}

/// Fast-forward-only update: fetch the remote tracking branch and hard
/// reset to it. Chosen over a three-way merge (spec.md §9 open question 2)
/// to avoid surprise merge commits on a background clone nobody is
/// reviewing.
fn update_existing(path: &Path, aborted: &Arc<AtomicBool>) -> Result<(), git2::Error> {
    let repo = Repository::open(path)?;
    let mut remote = repo.find_remote("origin")?;
    remote.fetch::<&str>(&[], Some(&mut fetch_options(aborted)), None)?;

    let head = repo.head()?;
    let branch_name = head.shorthand().unwrap_or("main").to_string();
    let remote_ref = format!("refs/remotes/origin/{branch_name}");
    let remote_commit = repo.find_reference(&remote_ref)?.peel_to_commit()?;

    repo.reset(remote_commit.as_object(), git2::ResetType::Hard, None)?;
    Ok(())
}

#[async_trait]
impl RepoFetcher for GitRepoFetcher {
    async fn fetch(&self, url: &str, repo_name: &str, cancel: &CancellationToken) -> FetchResult<PathBuf> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidArgument("url must not be blank".into()));
        }
        if repo_name.trim().is_empty() {
            return Err(FetchError::InvalidArgument("repo_name must not be blank".into()));
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let path = self.local_path(repo_name);
        let url = url.to_string();
        let clone_path = path.clone();
        let aborted = Arc::new(AtomicBool::new(false));
        let watched_aborted = Arc::clone(&aborted);
        let watched_cancel = cancel.clone();
        let watcher = tokio::spawn(async move {
            watched_cancel.cancelled().await;
            watched_aborted.store(true, Ordering::SeqCst);
        });

        let clone_aborted = Arc::clone(&aborted);
        let outcome = tokio::task::spawn_blocking(move || clone_or_update(&url, &clone_path, &clone_aborted))
            .await
            .map_err(|e| FetchError::InvalidArgument(format!("fetch task panicked: {e}")));
        watcher.abort();

        match outcome {
            Ok(Ok(())) => Ok(path),
            Ok(Err(_)) if aborted.load(Ordering::SeqCst) => Err(FetchError::Cancelled),
            Ok(Err(e)) => Err(FetchError::Git(e)),
            Err(e) => Err(e),
        }
    }

    async fn list_code_files(&self, local_path: &Path, cancel: &CancellationToken) -> FetchResult<Vec<PathBuf>> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let root = local_path.to_path_buf();
        tokio::task::spawn_blocking(move || Ok(walk_code_files(&root)))
            .await
            .map_err(|e| FetchError::InvalidArgument(format!("walk task panicked: {e}")))?
    }

    async fn read(&self, file_path: &Path, cancel: &CancellationToken) -> FetchResult<String> {
        let bytes = tokio::select! {
            result = tokio::fs::read(file_path) => result?,
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
        };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn walk_code_files(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            !entry.file_type().is_dir()
                || entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !DENIED_DIRS.contains(&name))
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn fetch_rejects_blank_url() {
        let fetcher = GitRepoFetcher::new(std::env::temp_dir());
        let cancel = CancellationToken::new();
        let err = fetcher.fetch("  ", "repo", &cancel).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn fetch_rejects_blank_repo_name() {
        let fetcher = GitRepoFetcher::new(std::env::temp_dir());
        let cancel = CancellationToken::new();
        let err = fetcher.fetch("https://example.com/r.git", " ", &cancel).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn fetch_short_circuits_when_already_cancelled() {
        let fetcher = GitRepoFetcher::new(std::env::temp_dir());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = fetcher.fetch("https://example.com/r.git", "repo", &cancel).await.unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }

    #[test]
    fn walk_code_files_respects_allow_and_deny_lists() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("notes.txt"), "irrelevant").unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/lib.js"), "skip me").unwrap();

        let files = walk_code_files(dir.path());
        let names: Vec<_> =
            files.iter().filter_map(|p| p.file_name().and_then(|n| n.to_str())).collect();

        assert!(names.contains(&"main.rs"));
        assert!(!names.contains(&"notes.txt"));
        assert!(!names.contains(&"lib.js"));
    }

    #[tokio::test]
    async fn read_recovers_lossily_from_invalid_utf8() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.rs");
        fs::write(&path, [0x66, 0x6e, 0xff, 0x28, 0x29]).unwrap();

        let fetcher = GitRepoFetcher::new(dir.path());
        let cancel = CancellationToken::new();
        let content = fetcher.read(&path, &cancel).await.unwrap();
        assert!(content.starts_with("fn"));
    }
}
