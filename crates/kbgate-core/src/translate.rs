//! Response translation
//!
//! Flattens the upstream response graph into the caller DTOs. Translation
//! never fails: every absent or malformed upstream detail degrades to an
//! empty string, an empty list, or a zero score.

use crate::upstream::{
    KnowledgeBaseRetrievalResult, Metadata, RetrievalLocation, RetrieveAndGenerateResponse,
    RetrieveResponse, RetrievedReference, UpstreamCitation,
};
use crate::{Citation, GenerationResult, Hit, Reference, RetrievalResult};

/// Metadata key under which the upstream stores a document's title
pub const DOC_TITLE_METADATA_KEY: &str = "x-amz-bedrock-kb-doc-title";

/// Maps upstream responses to caller DTOs
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTranslator {
    /// Fall back to the S3 URI when a location has no web URL
    include_s3_sources: bool,
}

impl ResponseTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_s3_sources(mut self, include: bool) -> Self {
        self.include_s3_sources = include;
        self
    }

    /// Translate a retrieve-and-generate response
    pub fn generation_result(&self, response: RetrieveAndGenerateResponse) -> GenerationResult {
        let answer_text = response
            .output
            .and_then(|output| output.text)
            .unwrap_or_default();

        let citations = response
            .citations
            .unwrap_or_default()
            .into_iter()
            .map(|c| self.citation(c))
            .collect();

        GenerationResult {
            answer_text,
            citations,
            session_id: response.session_id.filter(|id| !id.trim().is_empty()),
        }
    }

    /// Translate a retrieve-only response
    pub fn retrieval_result(&self, response: RetrieveResponse) -> RetrievalResult {
        let hits = response
            .retrieval_results
            .unwrap_or_default()
            .into_iter()
            .map(|r| self.hit(r))
            .collect();

        RetrievalResult { hits }
    }

    fn citation(&self, citation: UpstreamCitation) -> Citation {
        let answer_snippet = citation
            .generated_response_part
            .and_then(|part| part.text_response_part)
            .and_then(|part| part.text)
            .unwrap_or_default();

        let references = citation
            .retrieved_references
            .unwrap_or_default()
            .iter()
            .map(|r| self.reference(r))
            .collect();

        Citation {
            answer_snippet,
            references,
        }
    }

    fn reference(&self, reference: &RetrievedReference) -> Reference {
        Reference {
            title: document_title(reference.metadata.as_ref()),
            source_url: self.source_url(reference.location.as_ref()),
        }
    }

    fn hit(&self, result: KnowledgeBaseRetrievalResult) -> Hit {
        Hit {
            title: document_title(result.metadata.as_ref()),
            source_url: self.source_url(result.location.as_ref()),
            relevance_score: result.score.unwrap_or(0.0),
            content_preview: result
                .content
                .and_then(|content| content.text)
                .unwrap_or_default(),
        }
    }

    fn source_url(&self, location: Option<&RetrievalLocation>) -> String {
        let Some(location) = location else {
            return String::new();
        };

        let web = location.web_location.as_ref().and_then(|w| w.url.as_deref());
        let s3 = location
            .s3_location
            .as_ref()
            .and_then(|s| s.uri.as_deref())
            .filter(|_| self.include_s3_sources);

        web.or(s3).unwrap_or_default().to_string()
    }
}

/// Title from the document metadata; anything but a string value yields `""`
pub fn document_title(metadata: Option<&Metadata>) -> String {
    metadata
        .and_then(|m| m.get(DOC_TITLE_METADATA_KEY))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
