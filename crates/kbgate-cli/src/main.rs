//! KB Gateway CLI - Command-line interface
//!
//! Usage:
//!   kbgate ask <question> [--knowledge-base-id ID] [--model-arn ARN]
//!   kbgate retrieve <query> [--knowledge-base-id ID] [--max-results N]
//!   kbgate config

use anyhow::Context;
use clap::{Parser, Subcommand};
use kbgate_api::handlers::{rag::RagResponse, retrieve::RetrieveResponse};
use kbgate_core::{AppConfig, GenerationResult, RagRequest, RetrievalResult, RetrieveRequest};
use kbgate_rag::{BedrockKnowledgeBaseClient, KnowledgeBaseService};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kbgate")]
#[command(about = "Query a Bedrock knowledge base from the command line")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true, env = "KBGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and print the generated answer with citations
    Ask {
        /// Question to ask
        question: String,
        /// Knowledge base to query (defaults to configuration)
        #[arg(long)]
        knowledge_base_id: Option<String>,
        /// Generation model ARN (defaults to configuration)
        #[arg(long)]
        model_arn: Option<String>,
        /// Number of passages to retrieve
        #[arg(long)]
        max_results: Option<u32>,
    },
    /// Retrieve ranked passages without generation
    Retrieve {
        /// Search text
        query: String,
        /// Knowledge base to query (defaults to configuration)
        #[arg(long)]
        knowledge_base_id: Option<String>,
        /// Number of passages to return
        #[arg(long)]
        max_results: Option<u32>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config).context("failed to load configuration")?;

    match cli.command {
        Commands::Ask {
            question,
            knowledge_base_id,
            model_arn,
            max_results,
        } => {
            let request = RagRequest {
                question,
                knowledge_base_id,
                model_arn,
                session_id: None,
                max_results,
            };
            let result = service(&config).await.rag(&request).await?;
            println!("{}", render_answer(result)?);
        }
        Commands::Retrieve {
            query,
            knowledge_base_id,
            max_results,
        } => {
            let request = RetrieveRequest {
                query,
                knowledge_base_id,
                max_results,
            };
            let result = service(&config).await.retrieve(&request).await?;
            println!("{}", render_hits(result)?);
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

async fn service(config: &AppConfig) -> KnowledgeBaseService {
    let client = BedrockKnowledgeBaseClient::from_config(&config.knowledge_base).await;
    KnowledgeBaseService::from_config(Arc::new(client), &config.knowledge_base)
}

/// Render an answer in the same JSON shape as `POST /api/rag`
fn render_answer(result: GenerationResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RagResponse::from(result))
}

/// Render hits in the same JSON shape as `POST /api/retrieve`
fn render_hits(result: RetrievalResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RetrieveResponse::from(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use kbgate_core::{Citation, Hit, Reference};
    use serde_json::{json, Value};

    #[test]
    fn test_render_answer_matches_api_shape() {
        let result = GenerationResult {
            answer_text: "Refunds are processed within 14 days.".to_string(),
            citations: vec![Citation {
                answer_snippet: "Refunds are processed within 14 days.".to_string(),
                references: vec![Reference {
                    title: "Refund Policy".to_string(),
                    source_url: "https://docs.example.com/refunds".to_string(),
                }],
            }],
            session_id: None,
        };

        let rendered: Value = serde_json::from_str(&render_answer(result).unwrap()).unwrap();
        assert_eq!(
            rendered,
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
    }

    #[test]
    fn test_render_hits_matches_api_shape() {
        let result = RetrievalResult {
            hits: vec![Hit {
                title: "Pricing".to_string(),
                source_url: "https://docs.example.com/pricing".to_string(),
                relevance_score: 0.5,
                content_preview: "Three tiers".to_string(),
            }],
        };

        let rendered: Value = serde_json::from_str(&render_hits(result).unwrap()).unwrap();
        assert_eq!(
            rendered,
            json!({
                "hits": [{
                    "title": "Pricing",
                    "source": "https://docs.example.com/pricing",
                    "score": 0.5,
                    "contentPreview": "Three tiers"
                }]
            })
        );
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "kbgate",
            "ask",
            "What is the refund policy?",
            "--knowledge-base-id",
            "kb-123",
            "--max-results",
            "3",
        ]);

        match cli.command {
            Commands::Ask {
                question,
                knowledge_base_id,
                max_results,
                ..
            } => {
                assert_eq!(question, "What is the refund policy?");
                assert_eq!(knowledge_base_id.as_deref(), Some("kb-123"));
                assert_eq!(max_results, Some(3));
            }
            _ => panic!("expected ask"),
        }
    }
}
