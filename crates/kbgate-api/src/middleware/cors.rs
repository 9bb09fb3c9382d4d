//! Cross-origin policy
//!
//! Browser access is limited to the configured origin allow-list.
//! Credentialed requests are permitted, so request headers are mirrored
//! instead of wildcarded.
//!
//! Author: hephaex@gmail.com

use axum::http::{header, HeaderValue, Method};
use kbgate_core::ServerConfig;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Build the CORS layer, or `None` when no origin is configured
pub fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .map(|o| o.trim_end_matches('/'))
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(AllowHeaders::mirror_request())
            .expose_headers([header::LOCATION, header::CONTENT_DISPOSITION])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600)),
    )
}
