//! KB Gateway RAG - Knowledge-base question answering service
//!
//! This crate wires the request normalizer, an upstream knowledge-base
//! client, and the response translator into the two gateway operations:
//! - `rag`: retrieve passages and generate a cited answer
//! - `retrieve`: return ranked passages without generation
//!
//! Each call is independent; the service holds only immutable defaults and
//! a shared client.
//!
//! Author: hephaex@gmail.com

use kbgate_core::{
    normalize_generate, normalize_retrieve, GenerationResult, KnowledgeBaseClient,
    KnowledgeBaseConfig, KnowledgeBaseDefaults, RagRequest, ResponseTranslator, Result,
    RetrievalResult, RetrieveRequest,
};
use std::sync::Arc;
use std::time::Instant;

pub mod bedrock;

pub use bedrock::BedrockKnowledgeBaseClient;

/// Gateway service over a knowledge-base client
#[derive(Clone)]
pub struct KnowledgeBaseService {
    client: Arc<dyn KnowledgeBaseClient>,
    defaults: KnowledgeBaseDefaults,
    translator: ResponseTranslator,
}

impl KnowledgeBaseService {
    /// Create a new service
    pub fn new(client: Arc<dyn KnowledgeBaseClient>, defaults: KnowledgeBaseDefaults) -> Self {
        Self {
            client,
            defaults,
            translator: ResponseTranslator::new(),
        }
    }

    /// Create from config
    pub fn from_config(client: Arc<dyn KnowledgeBaseClient>, config: &KnowledgeBaseConfig) -> Self {
        Self::new(client, config.defaults())
            .with_translator(ResponseTranslator::new().with_s3_sources(config.include_s3_sources))
    }

    pub fn with_translator(mut self, translator: ResponseTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn defaults(&self) -> &KnowledgeBaseDefaults {
        &self.defaults
    }

    /// Answer a question from the knowledge base
    pub async fn rag(&self, request: &RagRequest) -> Result<GenerationResult> {
        let start = Instant::now();
        let query = normalize_generate(request, &self.defaults)?;

        tracing::debug!(
            knowledge_base_id = %query.knowledge_base_id,
            model_arn = %query.model_arn,
            max_results = query.max_results,
            client_session = query.session_id.as_deref().unwrap_or("-"),
            "Calling RetrieveAndGenerate"
        );

        let response = self
            .client
            .retrieve_and_generate(&query)
            .await
            .inspect_err(|e| {
                tracing::warn!(knowledge_base_id = %query.knowledge_base_id, "{}", e)
            })?;

        let result = self.translator.generation_result(response);

        tracing::debug!(
            citations = result.citations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "RetrieveAndGenerate completed"
        );

        Ok(result)
    }

    /// Retrieve ranked passages from the knowledge base
    pub async fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrievalResult> {
        let start = Instant::now();
        let query = normalize_retrieve(request, &self.defaults)?;

        tracing::debug!(
            knowledge_base_id = %query.knowledge_base_id,
            max_results = query.max_results,
            "Calling Retrieve"
        );

        let response = self
            .client
            .retrieve(&query)
            .await
            .inspect_err(|e| {
                tracing::warn!(knowledge_base_id = %query.knowledge_base_id, "{}", e)
            })?;

        let result = self.translator.retrieval_result(response);

        tracing::debug!(
            hits = result.hits.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieve completed"
        );

        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================
