// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Global portal search routes.

use crate::error::{AppError, Result};
use crate::models::{Portal, PortalType};
use crate::services::remote::SearchResult;
use crate::services::search::{SearchHit, SearchPage, SearchTicket};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/search/more", get(search_more))
        .route("/api/search/save", post(save_result))
}

#[derive(Deserialize)]
struct SearchQuery {
    query: String,
    #[serde(default)]
    offset: usize,
}

/// Search the remote directory by name and address.
async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchPage>> {
    if query.query.trim().is_empty() {
        return Err(AppError::BadRequest("Search query is empty".to_string()));
    }

    let ticket = state.search.lock().await.begin(&query.query, query.offset);
    Ok(Json(run_search(&state, ticket).await))
}

/// Next page of the most recent search.
async fn search_more(State(state): State<Arc<AppState>>) -> Result<Json<SearchPage>> {
    let ticket = state
        .search
        .lock()
        .await
        .load_more()
        .ok_or_else(|| AppError::BadRequest("No search in progress".to_string()))?;

    Ok(Json(run_search(&state, ticket).await))
}

async fn run_search(state: &AppState, ticket: SearchTicket) -> SearchPage {
    let results = state
        .remote
        .search_or_empty(&ticket.term, ticket.offset)
        .await;

    let hits: Vec<SearchHit> = {
        let registry = state.registry.lock().await;
        results
            .into_iter()
            .map(|result| SearchHit {
                saved_type: registry.get(&result.guid).map(|p| p.portal_type),
                result,
            })
            .collect()
    };

    tracing::info!(term = %ticket.term, offset = ticket.offset, count = hits.len(), "Portal search");
    state.search.lock().await.complete(&ticket, hits)
}

#[derive(Deserialize)]
struct SaveResultRequest {
    #[serde(flatten)]
    result: SearchResult,
    #[serde(rename = "type", default)]
    portal_type: Option<PortalType>,
}

/// Keep a search result as a portal.
async fn save_result(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveResultRequest>,
) -> Result<Json<Portal>> {
    let portal = req
        .result
        .into_portal(req.portal_type.unwrap_or(PortalType::Unknown));

    let mut registry = state.registry.lock().await;
    registry.upsert(portal.clone())?;

    tracing::info!(guid = %portal.guid, portal_type = %portal.portal_type, "Saved search result");
    Ok(Json(portal))
}
