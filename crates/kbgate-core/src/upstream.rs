//! Upstream knowledge-base response graph
//!
//! Mirrors the JSON shape of the Bedrock Agent Runtime `RetrieveAndGenerate`
//! and `Retrieve` responses. Every field is optional: the translator is the
//! only place that decides what an absent field means.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Per-document metadata attached to a retrieved passage
pub type Metadata = HashMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndGenerateResponse {
    pub output: Option<GenerationOutput>,
    pub citations: Option<Vec<UpstreamCitation>>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamCitation {
    pub generated_response_part: Option<GeneratedResponsePart>,
    pub retrieved_references: Option<Vec<RetrievedReference>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResponsePart {
    pub text_response_part: Option<TextResponsePart>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedReference {
    pub content: Option<RetrievalContent>,
    pub location: Option<RetrievalLocation>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalContent {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalLocation {
    /// Location kind as reported upstream (`WEB`, `S3`, ...)
    #[serde(rename = "type")]
    pub location_type: Option<String>,
    pub web_location: Option<WebLocation>,
    pub s3_location: Option<S3Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebLocation {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct S3Location {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    pub retrieval_results: Option<Vec<KnowledgeBaseRetrievalResult>>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseRetrievalResult {
    pub content: Option<RetrievalContent>,
    pub location: Option<RetrievalLocation>,
    pub metadata: Option<Metadata>,
    pub score: Option<f64>,
}
