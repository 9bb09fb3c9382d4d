//! Retrieve-and-generate handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use kbgate_core::{Citation, GenerationResult, RagRequest, Reference};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// RAG request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RagRequestBody {
    /// User's question (required, at most 8000 characters)
    #[serde(default)]
    #[schema(example = "What is the refund policy?")]
    pub question: String,

    /// Knowledge base to query; server default when absent
    #[schema(example = "kb-123")]
    pub knowledge_base_id: Option<String>,

    /// Generation model ARN; server default when absent
    #[schema(example = "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-3-haiku-20240307-v1:0")]
    pub model_arn: Option<String>,

    /// Client conversation id
    pub session_id: Option<String>,

    /// Number of passages to retrieve
    #[schema(example = 5, default = 5, minimum = 1)]
    pub max_results: Option<u32>,
}

impl From<RagRequestBody> for RagRequest {
    fn from(body: RagRequestBody) -> Self {
        Self {
            question: body.question,
            knowledge_base_id: body.knowledge_base_id,
            model_arn: body.model_arn,
            session_id: body.session_id,
            max_results: body.max_results,
        }
    }
}

/// Reference backing a citation
#[derive(Debug, Serialize, ToSchema)]
pub struct ReferenceDto {
    #[schema(example = "Refund Policy")]
    pub title: String,
    #[schema(example = "https://docs.example.com/refunds")]
    pub source: String,
}

impl From<Reference> for ReferenceDto {
    fn from(reference: Reference) -> Self {
        Self {
            title: reference.title,
            source: reference.source_url,
        }
    }
}

/// Citation information
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CitationDto {
    /// Span of the answer this citation supports
    pub snippet_from_answer: String,
    pub references: Vec<ReferenceDto>,
}

impl From<Citation> for CitationDto {
    fn from(citation: Citation) -> Self {
        Self {
            snippet_from_answer: citation.answer_snippet,
            references: citation.references.into_iter().map(Into::into).collect(),
        }
    }
}

/// RAG response body
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RagResponse {
    /// Generated answer
    #[schema(example = "Refunds are processed within 14 days.")]
    pub answer: String,

    /// Source citations
    pub citations: Vec<CitationDto>,

    /// Upstream session id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl From<GenerationResult> for RagResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            answer: result.answer_text,
            citations: result.citations.into_iter().map(Into::into).collect(),
            session_id: result.session_id,
        }
    }
}

/// Answer a question from the knowledge base
#[utoipa::path(
    post,
    path = "/api/rag",
    tag = "rag",
    request_body = RagRequestBody,
    responses(
        (status = 200, description = "Answer generated", body = RagResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 502, description = "Knowledge base call failed", body = crate::error::ApiError)
    )
)]
pub async fn rag_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RagRequestBody>,
) -> Result<Json<RagResponse>, AppError> {
    state.increment_requests();

    let result = state.service.rag(&body.into()).await?;

    Ok(Json(result.into()))
}
