//! Application state management
//!
//! Author: hephaex@gmail.com

use kbgate_core::{AppConfig, KnowledgeBaseClient};
use kbgate_rag::KnowledgeBaseService;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Knowledge-base gateway service
    pub service: KnowledgeBaseService,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
}

impl AppState {
    /// Create new application state with config and an upstream client
    pub fn new(config: AppConfig, client: Arc<dyn KnowledgeBaseClient>) -> Self {
        let service = KnowledgeBaseService::from_config(client, &config.knowledge_base);

        Self {
            config,
            service,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
