//! Query endpoint over [`codetriever_search::QueryEngine`] (C7, spec.md §7).

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::error::Result;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/ask", post(ask_handler))
}

fn default_max_results() -> usize {
    10
}

/// Request body for `POST /ask`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AskRequest {
    pub question: String,
    pub repo_name: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

/// A single cited source backing an [`AskResponse`]'s answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReferenceResponse {
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub score: f32,
}

impl From<codetriever_search::Reference> for ReferenceResponse {
    fn from(r: codetriever_search::Reference) -> Self {
        Self { file_path: r.file_path, start_line: r.start_line, end_line: r.end_line, score: r.score }
    }
}

/// Response for `POST /ask`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AskResponse {
    pub answer: String,
    pub references: Vec<ReferenceResponse>,
    pub duration_ms: u128,
}

impl From<codetriever_search::QueryResult> for AskResponse {
    fn from(r: codetriever_search::QueryResult) -> Self {
        Self {
            answer: r.answer,
            references: r.references.into_iter().map(Into::into).collect(),
            duration_ms: r.duration.as_millis(),
        }
    }
}

/// Answer a natural-language question about `repo_name`'s indexed code
/// (spec.md §7).
#[utoipa::path(
    post,
    path = "/ask",
    tag = "ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Synthesized answer with citations", body = AskResponse),
        (status = 400, description = "Blank question/repo_name or max_results == 0"),
    )
)]
/// # Errors
///
/// Returns [`crate::error::Error::InvalidArgument`] for blank fields or
/// `max_results == 0`, and maps other query failures to `500`.
pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let cancel = CancellationToken::new();
    let result = state
        .query_engine
        .ask(&request.question, &request.repo_name, request.max_results, &cancel)
        .await?;
    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn rejects_blank_question() {
        let app = routes().with_state(test_state());
        let body = serde_json::json!({ "question": "", "repo_name": "repo" });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn no_context_question_still_answers() {
        let app = routes().with_state(test_state());
        let body = serde_json::json!({ "question": "what does this do", "repo_name": "empty-repo" });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: AskResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(parsed.references.is_empty());
    }
}
