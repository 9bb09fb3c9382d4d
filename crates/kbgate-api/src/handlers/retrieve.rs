//! Retrieve-only handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use kbgate_core::{Hit, RetrievalResult, RetrieveRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Retrieve request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRequestBody {
    /// Search text (required, at most 8000 characters)
    #[serde(default)]
    #[schema(example = "pricing tiers")]
    pub query: String,

    /// Knowledge base to query; server default when absent
    pub knowledge_base_id: Option<String>,

    /// Number of passages to return
    #[schema(example = 5, default = 5, minimum = 1)]
    pub max_results: Option<u32>,
}

impl From<RetrieveRequestBody> for RetrieveRequest {
    fn from(body: RetrieveRequestBody) -> Self {
        Self {
            query: body.query,
            knowledge_base_id: body.knowledge_base_id,
            max_results: body.max_results,
        }
    }
}

/// Retrieved passage
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HitDto {
    #[schema(example = "Pricing")]
    pub title: String,
    #[schema(example = "https://docs.example.com/pricing")]
    pub source: String,
    #[schema(example = 0.82)]
    pub score: f64,
    pub content_preview: String,
}

impl From<Hit> for HitDto {
    fn from(hit: Hit) -> Self {
        Self {
            title: hit.title,
            source: hit.source_url,
            score: hit.relevance_score,
            content_preview: hit.content_preview,
        }
    }
}

/// Retrieve response body
#[derive(Debug, Serialize, ToSchema)]
pub struct RetrieveResponse {
    pub hits: Vec<HitDto>,
}

impl From<RetrievalResult> for RetrieveResponse {
    fn from(result: RetrievalResult) -> Self {
        Self {
            hits: result.hits.into_iter().map(Into::into).collect(),
        }
    }
}

/// Retrieve ranked passages without generation
#[utoipa::path(
    post,
    path = "/api/retrieve",
    tag = "rag",
    request_body = RetrieveRequestBody,
    responses(
        (status = 200, description = "Passages retrieved", body = RetrieveResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 502, description = "Knowledge base call failed", body = crate::error::ApiError)
    )
)]
pub async fn retrieve_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RetrieveRequestBody>,
) -> Result<Json<RetrieveResponse>, AppError> {
    state.increment_requests();

    let result = state.service.retrieve(&body.into()).await?;

    Ok(Json(result.into()))
}
