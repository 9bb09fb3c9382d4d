//! Bedrock Agent Runtime client
//!
//! Implements `KnowledgeBaseClient` on top of the AWS SDK. Credentials come
//! from the default provider chain (environment, profile, instance/task
//! role); the region and an optional endpoint override come from
//! `KnowledgeBaseConfig`.
//!
//! The SDK's output shapes are lifted field by field into the
//! `kbgate_core::upstream` graph. Nothing is defaulted here.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::types::{
    Citation as SdkCitation, KnowledgeBaseQuery, KnowledgeBaseRetrievalConfiguration,
    KnowledgeBaseRetrievalResult as SdkRetrievalResult,
    KnowledgeBaseRetrieveAndGenerateConfiguration, KnowledgeBaseVectorSearchConfiguration,
    RetrievalResultContent, RetrievalResultLocation, RetrieveAndGenerateConfiguration,
    RetrieveAndGenerateInput, RetrieveAndGenerateType, RetrievedReference as SdkReference,
};
use aws_sdk_bedrockagentruntime::Client;
use aws_smithy_types::{Document, Number};
use kbgate_core::upstream::{
    GeneratedResponsePart, GenerationOutput, KnowledgeBaseRetrievalResult, Metadata,
    RetrievalContent, RetrievalLocation, RetrieveAndGenerateResponse, RetrieveResponse,
    RetrievedReference, S3Location, TextResponsePart, UpstreamCitation, WebLocation,
};
use kbgate_core::{
    GatewayError, GenerateQuery, KnowledgeBaseClient, KnowledgeBaseConfig, Result, RetrieveQuery,
};
use serde_json::Value;
use std::collections::HashMap;

/// Knowledge-base client backed by Bedrock Agent Runtime
#[derive(Clone)]
pub struct BedrockKnowledgeBaseClient {
    client: Client,
}

impl BedrockKnowledgeBaseClient {
    /// Wrap an already configured SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create from config, resolving credentials from the default chain
    pub async fn from_config(config: &KnowledgeBaseConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_bedrockagentruntime::config::Builder::from(&sdk_config);
        if let Some(url) = &config.endpoint_url {
            tracing::info!("Using Bedrock endpoint override {}", url);
            builder = builder.endpoint_url(url);
        }

        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl KnowledgeBaseClient for BedrockKnowledgeBaseClient {
    async fn retrieve_and_generate(
        &self,
        query: &GenerateQuery,
    ) -> Result<RetrieveAndGenerateResponse> {
        let input = RetrieveAndGenerateInput::builder()
            .text(&query.question)
            .build()
            .map_err(request_build_error)?;

        let configuration = RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(knowledge_base_configuration(query)?)
            .build()
            .map_err(request_build_error)?;

        let output = self
            .client
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(configuration)
            .send()
            .await
            .map_err(|e| {
                GatewayError::upstream(format!(
                    "RetrieveAndGenerate failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(RetrieveAndGenerateResponse {
            output: output.output.map(|o| GenerationOutput {
                text: o.text.into(),
            }),
            citations: output
                .citations
                .map(|citations| citations.into_iter().map(lift_citation).collect()),
            session_id: output.session_id.into(),
        })
    }

    async fn retrieve(&self, query: &RetrieveQuery) -> Result<RetrieveResponse> {
        let retrieval_query = KnowledgeBaseQuery::builder().text(&query.query).build();

        let output = self
            .client
            .retrieve()
            .knowledge_base_id(&query.knowledge_base_id)
            .retrieval_query(retrieval_query)
            .retrieval_configuration(retrieval_configuration(query.max_results))
            .send()
            .await
            .map_err(|e| {
                GatewayError::upstream(format!("Retrieve failed: {}", DisplayErrorContext(&e)))
            })?;

        let results: Option<Vec<SdkRetrievalResult>> = output.retrieval_results.into();

        Ok(RetrieveResponse {
            retrieval_results: results
                .map(|results| results.into_iter().map(lift_retrieval_result).collect()),
            next_token: output.next_token,
        })
    }
}

fn knowledge_base_configuration(
    query: &GenerateQuery,
) -> Result<KnowledgeBaseRetrieveAndGenerateConfiguration> {
    KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
        .knowledge_base_id(&query.knowledge_base_id)
        .model_arn(&query.model_arn)
        .retrieval_configuration(retrieval_configuration(query.max_results))
        .build()
        .map_err(request_build_error)
}

/// Vector search settings; counts beyond `i32::MAX` are clamped
fn retrieval_configuration(max_results: u32) -> KnowledgeBaseRetrievalConfiguration {
    KnowledgeBaseRetrievalConfiguration::builder()
        .vector_search_configuration(
            KnowledgeBaseVectorSearchConfiguration::builder()
                .number_of_results(i32::try_from(max_results).unwrap_or(i32::MAX))
                .build(),
        )
        .build()
}

fn request_build_error(err: aws_sdk_bedrockagentruntime::error::BuildError) -> GatewayError {
    GatewayError::Other(anyhow::Error::new(err).context("failed to build upstream request"))
}

// ============================================================================
// SDK shape lifting
// ============================================================================

fn lift_citation(citation: SdkCitation) -> UpstreamCitation {
    UpstreamCitation {
        generated_response_part: citation.generated_response_part.map(|part| {
            GeneratedResponsePart {
                text_response_part: part.text_response_part.map(|text| TextResponsePart {
                    text: text.text.into(),
                }),
            }
        }),
        retrieved_references: citation
            .retrieved_references
            .map(|refs| refs.into_iter().map(lift_reference).collect()),
    }
}

fn lift_reference(reference: SdkReference) -> RetrievedReference {
    RetrievedReference {
        content: reference.content.map(lift_content),
        location: reference.location.map(lift_location),
        metadata: reference.metadata.map(lift_metadata),
    }
}

fn lift_retrieval_result(result: SdkRetrievalResult) -> KnowledgeBaseRetrievalResult {
    let content: Option<RetrievalResultContent> = result.content.into();

    KnowledgeBaseRetrievalResult {
        content: content.map(lift_content),
        location: result.location.map(lift_location),
        metadata: result.metadata.map(lift_metadata),
        score: result.score.into(),
    }
}

fn lift_content(content: RetrievalResultContent) -> RetrievalContent {
    RetrievalContent {
        text: content.text.into(),
    }
}

fn lift_location(location: RetrievalResultLocation) -> RetrievalLocation {
    RetrievalLocation {
        location_type: Some(location.r#type.as_str().to_string()),
        web_location: location.web_location.map(|web| WebLocation { url: web.url }),
        s3_location: location.s3_location.map(|s3| S3Location { uri: s3.uri }),
    }
}

fn lift_metadata(metadata: HashMap<String, Document>) -> Metadata {
    metadata
        .into_iter()
        .map(|(key, value)| (key, document_to_json(value)))
        .collect()
}

/// Convert a Smithy document into a JSON value
pub fn document_to_json(document: Document) -> Value {
    match document {
        Document::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, document_to_json(value)))
                .collect(),
        ),
        Document::Array(items) => Value::Array(items.into_iter().map(document_to_json).collect()),
        Document::Number(Number::PosInt(n)) => Value::from(n),
        Document::Number(Number::NegInt(n)) => Value::from(n),
        Document::Number(Number::Float(f)) => Value::from(f),
        Document::String(s) => Value::String(s),
        Document::Bool(b) => Value::Bool(b),
        Document::Null => Value::Null,
    }
}
