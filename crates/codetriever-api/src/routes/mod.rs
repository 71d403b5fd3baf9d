//! Route modules merged into a single `Router<AppState>` in [`create_router`].

pub mod ask;
pub mod health;
pub mod index;

use axum::Router;

use crate::state::AppState;

/// Build the full application router: health/status, the indexing control
/// plane, the RAG query endpoint, and the `OpenAPI`/Swagger UI surface.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(index::routes())
        .merge(ask::routes())
        .merge(crate::openapi::swagger_ui())
        .route("/api-docs/openapi.json", axum::routing::get(crate::openapi::openapi_json))
}
