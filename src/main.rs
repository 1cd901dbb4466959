// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mushy-Map API Server
//!
//! Keeps the portal registry on local disk and serves it, together with
//! the duration calculator, over a small JSON API.

use mushy_map::{
    config::Config,
    db::LocalStore,
    services::{EventBus, PortalRegistry, RemoteClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Mushy-Map API");

    // Open persisted state and load the registry
    let store = LocalStore::open(&config.data_dir)?;
    let events = EventBus::new();
    let registry = PortalRegistry::load(store, events.clone())?;
    tracing::info!(count = registry.len(), "Portal registry loaded");

    let remote = RemoteClient::from_config(&config)?;
    tracing::info!(base_url = %config.remote_base_url, "Remote directory client initialized");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), registry, remote, events));

    // Build router
    let app = mushy_map::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mushy_map=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
