//! KB Gateway API - REST server
//!
//! Exposes the knowledge-base gateway over HTTP:
//! - `POST /api/rag` - retrieve and generate a cited answer
//! - `POST /api/retrieve` - retrieve ranked passages
//! - `GET /health` - liveness probe
//! - `GET /swagger-ui/` - OpenAPI documentation
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI description of the gateway
#[derive(OpenApi)]
#[openapi(
    info(
        title = "KB Gateway API",
        description = "Knowledge-base question answering gateway"
    ),
    paths(
        handlers::health::health_check,
        handlers::rag::rag_handler,
        handlers::retrieve::retrieve_handler,
    ),
    components(schemas(
        handlers::health::HealthResponse,
        handlers::rag::RagRequestBody,
        handlers::rag::RagResponse,
        handlers::rag::CitationDto,
        handlers::rag::ReferenceDto,
        handlers::retrieve::RetrieveRequestBody,
        handlers::retrieve::RetrieveResponse,
        handlers::retrieve::HitDto,
        error::ApiError,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "rag", description = "Knowledge-base retrieval and generation")
    )
)]
pub struct ApiDoc;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body_size = state.config.server.max_body_size;

    // CORS applies to the /api routes only
    let api = match middleware::cors_layer(&state.config.server) {
        Some(cors) => routes::api_routes().layer(cors),
        None => routes::api_routes(),
    };

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
