//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::{rag, retrieve};
use crate::state::AppState;
use axum::{routing::post, Router};
use std::sync::Arc;

/// Create `/api` routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rag", post(rag::rag_handler))
        .route("/retrieve", post(retrieve::retrieve_handler))
}
