//! Control-plane surface over [`codetriever_indexing::JobRegistry`] (C8,
//! spec.md §6): start/status/cancel/delete/list per repository name.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use codetriever_indexing::{CancelOutcome, DeleteOutcome, JobState, JobStatus, StartOutcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/index", post(start_handler).get(list_handler))
        .route("/index/{repo_name}", axum::routing::delete(delete_handler))
        .route("/status/{repo_name}", get(status_handler))
        .route("/cancel/{repo_name}", post(cancel_handler))
}

/// Request body for `POST /index`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IndexRequest {
    /// Clone URL of the repository to index.
    pub repo_url: String,
    /// Unique, filesystem-safe name identifying this repository (spec.md §3 `RepoName`).
    pub repo_name: String,
}

/// Response for `POST /index`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IndexAcceptedResponse {
    pub repo_name: String,
    pub accepted: bool,
}

/// `Progress` serialized for the wire.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    pub total_files: usize,
    pub processed_files: usize,
    pub total_chunks: usize,
    pub current_file: Option<String>,
    pub errors: Vec<String>,
}

impl From<codetriever_indexing::Progress> for ProgressResponse {
    fn from(p: codetriever_indexing::Progress) -> Self {
        Self {
            total_files: p.total_files,
            processed_files: p.processed_files,
            total_chunks: p.total_chunks,
            current_file: p.current_file,
            errors: p.errors,
        }
    }
}

/// `Summary` serialized for the wire.
#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub files_processed: usize,
    pub chunks_indexed: usize,
    pub duration_ms: u128,
    pub errors: Vec<String>,
}

impl From<codetriever_indexing::Summary> for SummaryResponse {
    fn from(s: codetriever_indexing::Summary) -> Self {
        Self {
            files_processed: s.files_processed,
            chunks_indexed: s.chunks_indexed,
            duration_ms: s.duration.as_millis(),
            errors: s.errors,
        }
    }
}

/// Response for `GET /status/{repo_name}` and a row of `GET /index`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub repo_name: String,
    pub state: &'static str,
    pub progress: Option<ProgressResponse>,
    pub summary: Option<SummaryResponse>,
}

fn state_name(state: JobState) -> &'static str {
    match state {
        JobState::Indexing => "indexing",
        JobState::Completed => "completed",
        JobState::Failed => "failed",
        JobState::Cancelled => "cancelled",
    }
}

fn to_status_response(repo_name: String, status: JobStatus) -> StatusResponse {
    StatusResponse {
        repo_name,
        state: state_name(status.state),
        progress: status.progress.map(Into::into),
        summary: status.summary.map(Into::into),
    }
}

/// Response for `GET /index`.
#[derive(Debug, Serialize, ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<StatusResponse>,
}

/// Start indexing a repository (spec.md §6 "Start").
#[utoipa::path(
    post,
    path = "/index",
    tag = "index",
    request_body = IndexRequest,
    responses(
        (status = 200, description = "Indexing accepted", body = IndexAcceptedResponse),
        (status = 400, description = "Blank repo_url or repo_name"),
        (status = 409, description = "Repository is already indexing"),
    )
)]
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for blank fields, or
/// [`Error::AlreadyRunning`] if a non-terminal job already exists for this
/// `repo_name`.
pub async fn start_handler(
    State(state): State<AppState>,
    Json(request): Json<IndexRequest>,
) -> Result<Json<IndexAcceptedResponse>> {
    if request.repo_url.trim().is_empty() {
        return Err(Error::InvalidArgument("repo_url must not be blank".into()));
    }
    if request.repo_name.trim().is_empty() {
        return Err(Error::InvalidArgument("repo_name must not be blank".into()));
    }

    match state.registry.start(request.repo_url, request.repo_name.clone()) {
        StartOutcome::Accepted => {
            Ok(Json(IndexAcceptedResponse { repo_name: request.repo_name, accepted: true }))
        }
        StartOutcome::AlreadyRunning => Err(Error::AlreadyRunning(request.repo_name)),
    }
}

/// Current state and, while indexing, live progress (spec.md §6 "Status").
#[utoipa::path(
    get,
    path = "/status/{repo_name}",
    tag = "index",
    params(("repo_name" = String, Path, description = "Repository name")),
    responses(
        (status = 200, description = "Job status", body = StatusResponse),
        (status = 404, description = "No job known for repo_name"),
    )
)]
/// # Errors
///
/// Returns [`Error::NotFound`] if no job is known for `repo_name`.
pub async fn status_handler(
    State(state): State<AppState>,
    Path(repo_name): Path<String>,
) -> Result<Json<StatusResponse>> {
    state
        .registry
        .status(&repo_name)
        .map(|status| Json(to_status_response(repo_name.clone(), status)))
        .ok_or(Error::NotFound(repo_name))
}

/// Signal cancellation of a running job (spec.md §6 "Cancel").
#[utoipa::path(
    post,
    path = "/cancel/{repo_name}",
    tag = "index",
    params(("repo_name" = String, Path, description = "Repository name")),
    responses(
        (status = 200, description = "Cancellation signaled"),
        (status = 404, description = "No job known for repo_name"),
    )
)]
/// # Errors
///
/// Returns [`Error::NotFound`] if no job is known for `repo_name`.
pub async fn cancel_handler(
    State(state): State<AppState>,
    Path(repo_name): Path<String>,
) -> Result<Json<serde_json::Value>> {
    match state.registry.cancel(&repo_name) {
        CancelOutcome::Ok => Ok(Json(serde_json::json!({ "repo_name": repo_name, "cancelled": true }))),
        CancelOutcome::NotFound => Err(Error::NotFound(repo_name)),
    }
}

/// Remove a terminal job's bookkeeping and purge its vector store points
/// (spec.md §9 open question 1, resolved in favor of purging).
#[utoipa::path(
    delete,
    path = "/index/{repo_name}",
    tag = "index",
    params(("repo_name" = String, Path, description = "Repository name")),
    responses(
        (status = 200, description = "Job deleted and vector points purged"),
        (status = 404, description = "No job known for repo_name"),
        (status = 409, description = "Job is still indexing"),
    )
)]
/// # Errors
///
/// Returns [`Error::Conflict`] while the job is still indexing, or
/// [`Error::NotFound`] if no job is known for `repo_name`.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(repo_name): Path<String>,
) -> Result<Json<serde_json::Value>> {
    match state.registry.delete(&repo_name) {
        DeleteOutcome::Ok => {
            let mut filter = std::collections::BTreeMap::new();
            filter.insert("repo_name".to_string(), codetriever_vector_data::PayloadValue::from(repo_name.as_str()));
            let cancel = tokio_util::sync::CancellationToken::new();
            state.vector_store.delete_matching(filter, &cancel).await.map_err(|e| {
                Error::Internal(format!("job deleted but failed to purge vector store points: {e}"))
            })?;
            Ok(Json(serde_json::json!({ "repo_name": repo_name, "deleted": true })))
        }
        DeleteOutcome::Conflict => Err(Error::Conflict(repo_name)),
        DeleteOutcome::NotFound => Err(Error::NotFound(repo_name)),
    }
}

/// Enumerate all known repo names with their states (spec.md §6 "List").
#[utoipa::path(
    get,
    path = "/index",
    tag = "index",
    responses((status = 200, description = "Known jobs", body = JobListResponse))
)]
pub async fn list_handler(State(state): State<AppState>) -> Json<JobListResponse> {
    let jobs = state
        .registry
        .list()
        .into_iter()
        .map(|summary| StatusResponse {
            repo_name: summary.repo_name,
            state: state_name(summary.state),
            progress: summary.progress.map(Into::into),
            summary: None,
        })
        .collect();
    Json(JobListResponse { jobs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn start_rejects_blank_repo_name() {
        let app = routes().with_state(test_state());
        let body = serde_json::json!({ "repo_url": "https://example.com/r.git", "repo_name": "" });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/index")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn status_unknown_repo_is_not_found() {
        let app = routes().with_state(test_state());
        let response = app
            .oneshot(Request::builder().uri("/status/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn start_then_list_reports_the_job() {
        let state = test_state();
        let app = routes().with_state(state.clone());
        let body = serde_json::json!({ "repo_url": "https://example.com/r.git", "repo_name": "demo" });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/index")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/index").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let listed: JobListResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(listed.jobs.iter().any(|j| j.repo_name == "demo"));
    }
}
