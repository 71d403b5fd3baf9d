//! Liveness and readiness checks.

use axum::Json;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check)).route("/status", get(status))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "codetriever-api" }))
}

/// Server-wide status: version and a snapshot of known indexing jobs by state.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServerStatus {
    pub version: String,
    pub jobs_indexing: usize,
    pub jobs_completed: usize,
    pub jobs_failed: usize,
    pub jobs_cancelled: usize,
}

async fn status(State(state): State<AppState>) -> Json<ServerStatus> {
    use codetriever_indexing::JobState;

    let jobs = state.registry.list();
    let count = |s: JobState| jobs.iter().filter(|j| j.state == s).count();

    Json(ServerStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs_indexing: count(JobState::Indexing),
        jobs_completed: count(JobState::Completed),
        jobs_failed: count(JobState::Failed),
        jobs_cancelled: count(JobState::Cancelled),
    })
}
