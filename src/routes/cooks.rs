// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cook history routes.

use crate::error::{AppError, Result};
use crate::models::cook::{initial_hp, types_for_size};
use crate::models::{CookSize, CookType};
use crate::routes::portals::ChangeResponse;
use crate::services::cooking::{self, CookSummary};
use crate::services::registry::CookOutcome;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/cooks/types", get(get_cook_types))
        .route(
            "/api/portals/{guid}/cooks",
            get(get_cooks).post(start_cook),
        )
        .route("/api/portals/{guid}/cooks/finish", post(finish_cook))
        .route(
            "/api/portals/{guid}/cooks/{index}",
            put(edit_cook).delete(remove_cook),
        )
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct CookTypesQuery {
    size: CookSize,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CookTypeOption {
    #[serde(rename = "type")]
    pub cook_type: CookType,
    pub symbol: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub initial_hp: Option<u64>,
}

/// Cook types available for a size, with their starting HP.
async fn get_cook_types(Query(query): Query<CookTypesQuery>) -> Json<Vec<CookTypeOption>> {
    Json(
        types_for_size(query.size)
            .into_iter()
            .map(|cook_type| CookTypeOption {
                cook_type,
                symbol: cook_type.symbol().to_string(),
                initial_hp: initial_hp(query.size, cook_type),
            })
            .collect(),
    )
}

// ─── History ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CooksResponse {
    /// No cook is ongoing, so a new one may start.
    pub cookable: bool,
    pub recent: Vec<CookSummary>,
}

async fn get_cooks(
    State(state): State<Arc<AppState>>,
    Path(guid): Path<String>,
) -> Result<Json<CooksResponse>> {
    let registry = state.registry.lock().await;
    let portal = registry
        .get(&guid)
        .ok_or_else(|| AppError::NotFound(format!("Portal {} not found", guid)))?;

    Ok(Json(CooksResponse {
        cookable: portal.is_cookable(),
        recent: cooking::summarize(portal.cooks.as_deref().unwrap_or_default()),
    }))
}

#[derive(Deserialize)]
struct StartCookRequest {
    size: CookSize,
    #[serde(rename = "type")]
    cook_type: CookType,
}

/// Start cooking now. Refused (`changed: false`) while a cook is ongoing.
async fn start_cook(
    State(state): State<Arc<AppState>>,
    Path(guid): Path<String>,
    Json(req): Json<StartCookRequest>,
) -> Result<Json<ChangeResponse>> {
    let mut registry = state.registry.lock().await;
    let changed = registry.start_cook(&guid, req.size, req.cook_type, Utc::now())?;

    if changed {
        tracing::info!(guid = %guid, size = ?req.size, cook_type = ?req.cook_type, "Started cook");
    }
    Ok(Json(ChangeResponse { changed }))
}

/// Where the start time of a finished cook comes from.
#[derive(Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum StartFrom {
    /// Keep the recorded start.
    Recorded,
    /// The cook ran this long before the end.
    Duration {
        #[serde(default)]
        days: i64,
        #[serde(default)]
        hours: i64,
    },
    /// Derive from HP left and the rate it was consumed at.
    Hp { current_hp: f64, rate: f64 },
}

#[derive(Deserialize)]
struct FinishCookRequest {
    start_from: StartFrom,
    /// Defaults to now.
    #[serde(default, deserialize_with = "crate::time_utils::optional_timestamp::deserialize")]
    end: Option<DateTime<Utc>>,
    safe: bool,
    #[serde(default)]
    note: Option<String>,
}

/// Finish the ongoing cook.
async fn finish_cook(
    State(state): State<Arc<AppState>>,
    Path(guid): Path<String>,
    Json(req): Json<FinishCookRequest>,
) -> Result<Json<ChangeResponse>> {
    let end = req.end.unwrap_or_else(Utc::now);

    let mut registry = state.registry.lock().await;
    let Some(ongoing) = registry
        .get(&guid)
        .and_then(|p| p.cooks.as_ref())
        .and_then(|cooks| cooks.iter().find(|c| c.is_ongoing()))
        .cloned()
    else {
        return Ok(Json(ChangeResponse { changed: false }));
    };

    let start = match req.start_from {
        StartFrom::Recorded => ongoing.start,
        StartFrom::Duration { days, hours } => cooking::start_time_from_duration(end, days, hours)
            .ok_or_else(|| {
                AppError::BadRequest("Duration must be at least one hour and within range".to_string())
            })?,
        StartFrom::Hp { current_hp, rate } => cooking::start_time_from_hp(
            ongoing.size,
            ongoing.cook_type,
            current_hp,
            rate,
            end,
        )
        .ok_or_else(|| {
            AppError::BadRequest("Need a known cook size and type, a positive rate and a start within range".to_string())
        })?,
    };

    let changed = registry.finish_cook(
        &guid,
        CookOutcome {
            start,
            end,
            safe: req.safe,
            note: req.note,
        },
    )?;

    Ok(Json(ChangeResponse { changed }))
}

#[derive(Deserialize)]
struct EditCookRequest {
    #[serde(deserialize_with = "crate::time_utils::timestamp::deserialize")]
    end: DateTime<Utc>,
    #[serde(default)]
    days: i64,
    #[serde(default)]
    hours: i64,
    safe: bool,
    #[serde(default)]
    note: Option<String>,
}

/// Rewrite a finished cook from its end time and duration.
async fn edit_cook(
    State(state): State<Arc<AppState>>,
    Path((guid, index)): Path<(String, usize)>,
    Json(req): Json<EditCookRequest>,
) -> Result<Json<ChangeResponse>> {
    let start = cooking::start_time_from_duration(req.end, req.days, req.hours).ok_or_else(|| {
        AppError::BadRequest("Duration must be at least one hour and within range".to_string())
    })?;

    let mut registry = state.registry.lock().await;
    let changed = registry.edit_cook(
        &guid,
        index,
        CookOutcome {
            start,
            end: req.end,
            safe: req.safe,
            note: req.note,
        },
    )?;

    Ok(Json(ChangeResponse { changed }))
}

/// Remove a cook from the history, or abandon the ongoing one.
async fn remove_cook(
    State(state): State<Arc<AppState>>,
    Path((guid, index)): Path<(String, usize)>,
) -> Result<Json<ChangeResponse>> {
    let mut registry = state.registry.lock().await;
    let changed = registry.remove_cook(&guid, index)?;
    Ok(Json(ChangeResponse { changed }))
}
