//! KB Gateway Core - Request normalization, response translation, and shared types
//!
//! This crate defines the pieces of the gateway that do not depend on a
//! transport or web framework:
//! - Request models and their server-side defaulting (`normalize`)
//! - The upstream knowledge-base response graph (`upstream`)
//! - Flattening of upstream responses into caller DTOs (`translate`)
//! - Common error types
//! - The `KnowledgeBaseClient` trait implemented by upstream clients
//! - Configuration management

pub mod config;
pub mod normalize;
pub mod translate;
pub mod upstream;

pub use config::{
    AppConfig, ConfigError, KnowledgeBaseConfig, LoggingConfig, ServerConfig,
};
pub use normalize::{
    normalize_generate, normalize_retrieve, GenerateQuery, KnowledgeBaseDefaults, RagRequest,
    RetrieveQuery, RetrieveRequest, DEFAULT_MAX_RESULTS, MAX_QUESTION_CHARS,
};
pub use translate::{ResponseTranslator, DOC_TITLE_METADATA_KEY};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required request field is missing, blank, or out of range after defaulting
    #[error("{0}")]
    InvalidArgument(String),

    /// The upstream retrieval/generation call failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }
}

impl From<ConfigError> for GatewayError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

// ============================================================================
// Caller-facing Results
// ============================================================================

/// Result of a retrieve-and-generate call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Generated answer (empty when the upstream returned no output)
    pub answer_text: String,

    /// Spans of the answer with their supporting references, in upstream order
    pub citations: Vec<Citation>,

    /// Upstream-issued session identifier
    pub session_id: Option<String>,
}

/// A span of generated text linked to its supporting references
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub answer_snippet: String,
    pub references: Vec<Reference>,
}

/// A document backing a citation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub source_url: String,
}

/// Result of a retrieve-only call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<Hit>,
}

/// A ranked passage returned by retrieve-only mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub title: String,
    pub source_url: String,
    /// Upstream relevance score, 0.0 when absent
    pub relevance_score: f64,
    pub content_preview: String,
}

// ============================================================================
// Traits
// ============================================================================

/// Upstream knowledge-base service
///
/// Implementations perform the network call and lift the upstream payload
/// into the `upstream` response graph. They do not default or flatten
/// anything; that is the translator's job.
#[async_trait::async_trait]
pub trait KnowledgeBaseClient: Send + Sync {
    /// Retrieve passages and generate an answer from them
    async fn retrieve_and_generate(
        &self,
        query: &GenerateQuery,
    ) -> Result<upstream::RetrieveAndGenerateResponse>;

    /// Retrieve ranked passages without generation
    async fn retrieve(&self, query: &RetrieveQuery) -> Result<upstream::RetrieveResponse>;
}
