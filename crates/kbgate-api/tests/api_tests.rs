//! API Integration Tests
//!
//! The upstream knowledge base is replaced by an in-memory client so the
//! full HTTP path (extraction, normalization, translation, error mapping)
//! runs without AWS credentials.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use kbgate_api::{create_router, state::AppState};
use kbgate_core::upstream::{RetrieveAndGenerateResponse, RetrieveResponse};
use kbgate_core::{
    AppConfig, GatewayError, GenerateQuery, KnowledgeBaseClient, Result, RetrieveQuery,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Canned upstream that remembers the last resolved queries
#[derive(Default)]
struct StubKnowledgeBase {
    rag_response: Value,
    retrieve_response: Value,
    fail_with: Option<String>,
    last_generate: Mutex<Option<GenerateQuery>>,
    last_retrieve: Mutex<Option<RetrieveQuery>>,
}

#[async_trait]
impl KnowledgeBaseClient for StubKnowledgeBase {
    async fn retrieve_and_generate(
        &self,
        query: &GenerateQuery,
    ) -> Result<RetrieveAndGenerateResponse> {
        *self.last_generate.lock().unwrap() = Some(query.clone());
        if let Some(msg) = &self.fail_with {
            return Err(GatewayError::upstream(msg.clone()));
        }
        Ok(serde_json::from_value(self.rag_response.clone()).unwrap_or_default())
    }

    async fn retrieve(&self, query: &RetrieveQuery) -> Result<RetrieveResponse> {
        *self.last_retrieve.lock().unwrap() = Some(query.clone());
        if let Some(msg) = &self.fail_with {
            return Err(GatewayError::upstream(msg.clone()));
        }
        Ok(serde_json::from_value(self.retrieve_response.clone()).unwrap_or_default())
    }
}

fn config_with_defaults(kb_id: &str, model_arn: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.knowledge_base.default_knowledge_base_id = kb_id.to_string();
    config.knowledge_base.default_model_arn = model_arn.to_string();
    config
}

fn app(config: AppConfig, stub: Arc<StubKnowledgeBase>) -> Router {
    create_router(Arc::new(AppState::new(config, stub)))
}

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = app(AppConfig::default(), Arc::new(StubKnowledgeBase::default()));

    let (status, json) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptimeSeconds"].is_number());
}

#[tokio::test]
async fn test_openapi_document() {
    let app = app(AppConfig::default(), Arc::new(StubKnowledgeBase::default()));

    let (status, json) = send(
        app,
        Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/rag"].is_object());
    assert!(json["paths"]["/api/retrieve"].is_object());
}

// =============================================================================
// RAG API Tests
// =============================================================================

#[tokio::test]
async fn test_rag_refund_policy_scenario() {
    let stub = Arc::new(StubKnowledgeBase {
        rag_response: json!({
            "output": { "text": "Refunds are processed within 14 days." },
            "citations": [{
                "generatedResponsePart": {
                    "textResponsePart": { "text": "Refunds are processed within 14 days." }
                },
                "retrievedReferences": [{
                    "location": {
                        "type": "WEB",
                        "webLocation": { "url": "https://docs.example.com/refunds" }
                    },
                    "metadata": { "x-amz-bedrock-kb-doc-title": "Refund Policy" }
                }]
            }]
        }),
        ..Default::default()
    });

    let request = create_json_request(
        "POST",
        "/api/rag",
        Some(json!({
            "question": "What is the refund policy?",
            "knowledgeBaseId": "kb-123",
            "modelArn": "arn:aws:bedrock:us-east-1::foundation-model/x"
        })),
    );

    let (status, json) = send(app(AppConfig::default(), stub.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "answer": "Refunds are processed within 14 days.",
            "citations": [{
                "snippetFromAnswer": "Refunds are processed within 14 days.",
                "references": [{
                    "title": "Refund Policy",
                    "source": "https://docs.example.com/refunds"
                }]
            }]
        })
    );

    let query = stub.last_generate.lock().unwrap().clone().unwrap();
    assert_eq!(query.knowledge_base_id, "kb-123");
    assert_eq!(query.model_arn, "arn:aws:bedrock:us-east-1::foundation-model/x");
    assert_eq!(query.max_results, 5);
}

#[tokio::test]
async fn test_rag_uses_configured_defaults() {
    let stub = Arc::new(StubKnowledgeBase {
        rag_response: json!({ "output": { "text": "ok" }, "sessionId": "sess-42" }),
        ..Default::default()
    });
    let config = config_with_defaults("kb-default", "arn:model-default");

    let request = create_json_request(
        "POST",
        "/api/rag",
        Some(json!({ "question": "hello", "sessionId": "web-1a2b3c4d", "maxResults": 8 })),
    );

    let (status, json) = send(app(config, stub.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["answer"], "ok");
    assert_eq!(json["citations"], json!([]));
    assert_eq!(json["sessionId"], "sess-42");

    let query = stub.last_generate.lock().unwrap().clone().unwrap();
    assert_eq!(query.knowledge_base_id, "kb-default");
    assert_eq!(query.model_arn, "arn:model-default");
    assert_eq!(query.max_results, 8);
}

#[tokio::test]
async fn test_rag_missing_model_arn() {
    let stub = Arc::new(StubKnowledgeBase::default());
    let config = config_with_defaults("kb-default", "");

    let request = create_json_request("POST", "/api/rag", Some(json!({ "question": "hello" })));
    let (status, json) = send(app(config, stub.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("modelArn is required"));
    assert!(stub.last_generate.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_rag_empty_question() {
    let config = config_with_defaults("kb-default", "arn:model");

    for body in [json!({ "question": "" }), json!({ "question": "   " }), json!({})] {
        let request = create_json_request("POST", "/api/rag", Some(body));
        let (status, json) = send(
            app(config.clone(), Arc::new(StubKnowledgeBase::default())),
            request,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "question must not be blank");
    }
}

#[tokio::test]
async fn test_rag_question_too_long() {
    let config = config_with_defaults("kb-default", "arn:model");
    let request = create_json_request(
        "POST",
        "/api/rag",
        Some(json!({ "question": "x".repeat(8001) })),
    );

    let (status, _) = send(app(config, Arc::new(StubKnowledgeBase::default())), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rag_upstream_failure() {
    let stub = Arc::new(StubKnowledgeBase {
        fail_with: Some("ThrottlingException: Too many requests".to_string()),
        ..Default::default()
    });
    let config = config_with_defaults("kb-default", "arn:model");

    let request = create_json_request("POST", "/api/rag", Some(json!({ "question": "hello" })));
    let (status, json) = send(app(config, stub), request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert!(json["details"].as_str().unwrap().contains("ThrottlingException"));
}

// =============================================================================
// Retrieve API Tests
// =============================================================================

#[tokio::test]
async fn test_retrieve_without_knowledge_base() {
    let request = create_json_request(
        "POST",
        "/api/retrieve",
        Some(json!({ "query": "pricing tiers", "maxResults": 3 })),
    );

    let (status, json) = send(
        app(AppConfig::default(), Arc::new(StubKnowledgeBase::default())),
        request,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("knowledgeBaseId is required"));
}

#[tokio::test]
async fn test_retrieve_hits() {
    let stub = Arc::new(StubKnowledgeBase {
        retrieve_response: json!({
            "retrievalResults": [
                {
                    "content": { "text": "The Pro tier includes SSO." },
                    "location": { "type": "WEB", "webLocation": { "url": "https://docs.example.com/pricing" } },
                    "metadata": { "x-amz-bedrock-kb-doc-title": "Pricing" },
                    "score": 0.91
                },
                {
                    "location": { "type": "S3", "s3Location": { "uri": "s3://kb-docs/tiers.pdf" } },
                    "metadata": { "x-amz-bedrock-kb-source-uri": "s3://kb-docs/tiers.pdf" }
                }
            ]
        }),
        ..Default::default()
    });

    let request = create_json_request(
        "POST",
        "/api/retrieve",
        Some(json!({ "query": "pricing tiers", "knowledgeBaseId": "kb-123", "maxResults": 3 })),
    );

    let (status, json) = send(app(AppConfig::default(), stub.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "hits": [
                {
                    "title": "Pricing",
                    "source": "https://docs.example.com/pricing",
                    "score": 0.91,
                    "contentPreview": "The Pro tier includes SSO."
                },
                { "title": "", "source": "", "score": 0.0, "contentPreview": "" }
            ]
        })
    );

    let query = stub.last_retrieve.lock().unwrap().clone().unwrap();
    assert_eq!(query.max_results, 3);
    assert_eq!(query.knowledge_base_id, "kb-123");
}

#[tokio::test]
async fn test_retrieve_ignores_missing_model() {
    let stub = Arc::new(StubKnowledgeBase::default());
    let config = config_with_defaults("kb-default", "");

    let request = create_json_request("POST", "/api/retrieve", Some(json!({ "query": "q" })));
    let (status, json) = send(app(config, stub), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "hits": [] }));
}

// =============================================================================
// CORS Tests
// =============================================================================

#[tokio::test]
async fn test_cors_preflight_allowed_origin() {
    let mut config = config_with_defaults("kb-default", "arn:model");
    config.server.cors_origins = vec!["https://www.example.com".to_string()];

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/rag")
        .header(header::ORIGIN, "https://www.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app(config, Arc::new(StubKnowledgeBase::default()))
        .oneshot(request)
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://www.example.com"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_other_origin() {
    let mut config = config_with_defaults("kb-default", "arn:model");
    config.server.cors_origins = vec!["https://www.example.com".to_string()];

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/rag")
        .header(header::ORIGIN, "https://evil.example.net")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app(config, Arc::new(StubKnowledgeBase::default()))
        .oneshot(request)
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cors_not_applied_outside_api() {
    let mut config = config_with_defaults("kb-default", "arn:model");
    config.server.cors_origins = vec!["https://www.example.com".to_string()];

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://www.example.com")
        .body(Body::empty())
        .unwrap();

    let response = app(config, Arc::new(StubKnowledgeBase::default()))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
