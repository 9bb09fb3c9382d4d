//! Request normalization
//!
//! Validates inbound questions and resolves optional identifiers against
//! the process-wide defaults. Everything here is a pure function of the
//! request and the defaults.

use crate::{GatewayError, Result};
use serde::{Deserialize, Serialize};

/// Result count used when the caller does not ask for one
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// Upper bound on question/query length, in characters
pub const MAX_QUESTION_CHARS: usize = 8000;

/// Process-wide identifiers applied when a request leaves them blank
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBaseDefaults {
    pub default_knowledge_base_id: String,
    pub default_model_arn: String,
}

impl KnowledgeBaseDefaults {
    pub fn new(knowledge_base_id: impl Into<String>, model_arn: impl Into<String>) -> Self {
        Self {
            default_knowledge_base_id: knowledge_base_id.into(),
            default_model_arn: model_arn.into(),
        }
    }
}

/// Inbound retrieve-and-generate request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagRequest {
    pub question: String,
    pub knowledge_base_id: Option<String>,
    pub model_arn: Option<String>,
    pub session_id: Option<String>,
    pub max_results: Option<u32>,
}

impl RagRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }
}

/// Inbound retrieve-only request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    pub knowledge_base_id: Option<String>,
    pub max_results: Option<u32>,
}

impl RetrieveRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Fully resolved retrieve-and-generate query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateQuery {
    pub question: String,
    pub knowledge_base_id: String,
    pub model_arn: String,
    pub max_results: u32,
    /// Client-supplied session id; informational only
    pub session_id: Option<String>,
}

/// Fully resolved retrieve-only query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveQuery {
    pub query: String,
    pub knowledge_base_id: String,
    pub max_results: u32,
}

/// Resolve a retrieve-and-generate request against the defaults
pub fn normalize_generate(
    request: &RagRequest,
    defaults: &KnowledgeBaseDefaults,
) -> Result<GenerateQuery> {
    let question = validate_text("question", &request.question)?;
    let knowledge_base_id = resolve_knowledge_base_id(
        request.knowledge_base_id.as_deref(),
        &defaults.default_knowledge_base_id,
    )?;
    let model_arn = resolve(request.model_arn.as_deref(), &defaults.default_model_arn)
        .ok_or_else(|| {
            GatewayError::invalid_argument(
                "modelArn is required (configure default or pass in body)",
            )
        })?;

    Ok(GenerateQuery {
        question,
        knowledge_base_id,
        model_arn,
        max_results: resolve_max_results(request.max_results)?,
        session_id: non_blank(request.session_id.as_deref()).map(str::to_string),
    })
}

/// Resolve a retrieve-only request against the defaults
///
/// The model default is never consulted.
pub fn normalize_retrieve(
    request: &RetrieveRequest,
    defaults: &KnowledgeBaseDefaults,
) -> Result<RetrieveQuery> {
    let query = validate_text("query", &request.query)?;
    let knowledge_base_id = resolve_knowledge_base_id(
        request.knowledge_base_id.as_deref(),
        &defaults.default_knowledge_base_id,
    )?;

    Ok(RetrieveQuery {
        query,
        knowledge_base_id,
        max_results: resolve_max_results(request.max_results)?,
    })
}

fn validate_text(field: &str, text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(GatewayError::invalid_argument(format!(
            "{field} must not be blank"
        )));
    }
    if text.chars().count() > MAX_QUESTION_CHARS {
        return Err(GatewayError::invalid_argument(format!(
            "{field} must be at most {MAX_QUESTION_CHARS} characters"
        )));
    }
    Ok(text.to_string())
}

fn resolve_knowledge_base_id(requested: Option<&str>, default: &str) -> Result<String> {
    resolve(requested, default).ok_or_else(|| {
        GatewayError::invalid_argument(
            "knowledgeBaseId is required (configure default or pass in body)",
        )
    })
}

fn resolve_max_results(requested: Option<u32>) -> Result<u32> {
    match requested {
        Some(0) => Err(GatewayError::invalid_argument(
            "maxResults must be a positive integer",
        )),
        Some(n) => Ok(n),
        None => Ok(DEFAULT_MAX_RESULTS),
    }
}

/// Requested value if non-blank, else the default if non-blank
fn resolve(requested: Option<&str>, default: &str) -> Option<String> {
    non_blank(requested)
        .or_else(|| non_blank(Some(default)))
        .map(str::to_string)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
