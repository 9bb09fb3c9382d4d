//! KB Gateway API Server
//!
//! REST gateway in front of a Bedrock knowledge base.
//!
//! Author: hephaex@gmail.com

use kbgate_api::{create_router, state::AppState};
use kbgate_core::config::{AppConfig, LoggingConfig};
use kbgate_rag::BedrockKnowledgeBaseClient;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load(std::env::var("KBGATE_CONFIG").ok())?;

    init_tracing(&config.logging);

    if config.knowledge_base.default_knowledge_base_id.is_empty() {
        tracing::warn!("No default knowledge base configured; requests must pass knowledgeBaseId");
    }
    if config.knowledge_base.default_model_arn.is_empty() {
        tracing::warn!("No default model configured; /api/rag requests must pass modelArn");
    }

    // Create upstream client and application state
    let client = BedrockKnowledgeBaseClient::from_config(&config.knowledge_base).await;
    let addr = config.server.bind_addr();
    let state = Arc::new(AppState::new(config, Arc::new(client)));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("KB Gateway API starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("kbgate_api={0},kbgate_rag={0},tower_http={0}", logging.level).into()
    });

    if logging.json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
