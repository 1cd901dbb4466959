// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod cooks;
pub mod duration;
pub mod events;
pub mod portals;
pub mod search;

use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
    pub portals: usize,
}

/// Liveness plus the size of the registry.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let portals = state.registry.lock().await.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
        portals,
    })
}

/// The configured frontend, or any local development server.
fn is_allowed_origin(origin: &HeaderValue, frontend_url: &str) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    origin == frontend_url
        || origin.starts_with("http://localhost")
        || origin.starts_with("http://127.0.0.1")
}

fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _parts| {
            is_allowed_origin(origin, &frontend_url)
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        // Export downloads read their filename from this header.
        .expose_headers([header::CONTENT_DISPOSITION])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(portals::routes())
        .merge(cooks::routes())
        .merge(search::routes())
        .merge(duration::routes())
        .merge(events::routes())
        .layer(cors_layer(state.config.frontend_url.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins() {
        let frontend = "https://map.example.com";
        let allowed = |o: &'static str| is_allowed_origin(&HeaderValue::from_static(o), frontend);

        assert!(allowed("https://map.example.com"));
        assert!(allowed("http://localhost:5173"));
        assert!(allowed("http://127.0.0.1:8080"));
        assert!(!allowed("https://evil.example.com"));
        assert!(!allowed("https://map.example.com.evil.test"));
    }
}
