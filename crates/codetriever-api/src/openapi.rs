//! `OpenAPI` documentation generation and Swagger UI setup.

use axum::{Json, response::IntoResponse};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// `OpenAPI` documentation for the codetriever control plane and query API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::index::start_handler,
        crate::routes::index::status_handler,
        crate::routes::index::cancel_handler,
        crate::routes::index::delete_handler,
        crate::routes::index::list_handler,
        crate::routes::ask::ask_handler,
    ),
    components(
        schemas(
            crate::routes::index::IndexRequest,
            crate::routes::index::IndexAcceptedResponse,
            crate::routes::index::StatusResponse,
            crate::routes::index::ProgressResponse,
            crate::routes::index::SummaryResponse,
            crate::routes::index::JobListResponse,
            crate::routes::ask::AskRequest,
            crate::routes::ask::AskResponse,
            crate::routes::ask::ReferenceResponse,
            crate::routes::health::ServerStatus,
        )
    ),
    tags(
        (name = "index", description = "Repository indexing control plane"),
        (name = "ask", description = "Natural-language code question answering"),
        (name = "health", description = "Liveness and server status"),
    ),
    info(
        title = "Codetriever API",
        version = "0.1.0",
        description = "Semantic code search and retrieval-augmented question answering",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    )
)]
pub struct ApiDoc;

/// Returns configured Swagger UI service, mounted at `/swagger-ui`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Returns `OpenAPI` JSON as a response.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
