// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Portal registry routes: CRUD, import/export, remote fetch and layers.

use crate::error::{AppError, Result};
use crate::models::portal::parse_type_list;
use crate::models::{Portal, PortalType, ViewBounds};
use crate::services::events::DomainEvent;
use crate::services::layers::{LayersView, MarkerLayers, Mode};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/portals",
            get(list_portals).post(create_portal).delete(delete_portals),
        )
        .route("/api/portals/export", get(export_portals))
        .route("/api/portals/import", post(import_portals))
        .route("/api/portals/fetch", post(fetch_portals))
        .route("/api/portals/{guid}", get(get_portal))
        .route("/api/portals/{guid}/type", put(set_portal_type))
        .route("/api/portals/{guid}/image", post(load_portal_image))
        .route("/api/portals/{guid}/open", post(open_portal))
        .route("/api/layers", get(get_layers))
}

/// Result of a guid-addressed mutation. Missing guids are not errors.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChangeResponse {
    pub changed: bool,
}

#[derive(Deserialize, Default)]
struct TypesQuery {
    /// Comma separated portal types
    types: Option<String>,
}

impl TypesQuery {
    fn parse(&self) -> Result<Vec<PortalType>> {
        match self.types.as_deref() {
            Some(raw) => parse_type_list(raw).map_err(AppError::BadRequest),
            None => Ok(Vec::new()),
        }
    }
}

// ─── Listing ─────────────────────────────────────────────────

async fn list_portals(State(state): State<Arc<AppState>>) -> Json<Vec<Portal>> {
    let registry = state.registry.lock().await;
    Json(registry.list().into_iter().cloned().collect())
}

async fn get_portal(
    State(state): State<Arc<AppState>>,
    Path(guid): Path<String>,
) -> Result<Json<Portal>> {
    let registry = state.registry.lock().await;
    registry
        .get(&guid)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Portal {} not found", guid)))
}

// ─── Single Portal ───────────────────────────────────────────

#[derive(Deserialize)]
struct CreatePortalRequest {
    lat: f64,
    lng: f64,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    portal_type: Option<PortalType>,
}

/// Place a portal by hand.
async fn create_portal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePortalRequest>,
) -> Result<(StatusCode, Json<Portal>)> {
    if !req.lat.is_finite() || req.lat.abs() > 90.0 {
        return Err(AppError::BadRequest(
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if !req.lng.is_finite() || req.lng.abs() > 180.0 {
        return Err(AppError::BadRequest(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }

    let mut registry = state.registry.lock().await;
    let portal = registry.create_manual(
        req.lat,
        req.lng,
        req.name.as_deref(),
        req.portal_type.unwrap_or(PortalType::Unknown),
    )?;

    Ok((StatusCode::CREATED, Json(portal)))
}

#[derive(Deserialize)]
struct SetTypeRequest {
    #[serde(rename = "type")]
    portal_type: PortalType,
}

async fn set_portal_type(
    State(state): State<Arc<AppState>>,
    Path(guid): Path<String>,
    Json(req): Json<SetTypeRequest>,
) -> Result<Json<ChangeResponse>> {
    let mut registry = state.registry.lock().await;
    let changed = registry.set_type(&guid, req.portal_type)?;
    Ok(Json(ChangeResponse { changed }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImageResponse {
    pub image: Option<String>,
    pub changed: bool,
}

/// Look up a portal's image in the remote directory and remember it.
///
/// The portal may be deleted while the lookup runs; the result is then
/// dropped.
async fn load_portal_image(
    State(state): State<Arc<AppState>>,
    Path(guid): Path<String>,
) -> Result<Json<ImageResponse>> {
    {
        let registry = state.registry.lock().await;
        match registry.get(&guid) {
            None => return Err(AppError::NotFound(format!("Portal {} not found", guid))),
            Some(portal) if portal.image.is_some() => {
                return Ok(Json(ImageResponse {
                    image: portal.image.clone(),
                    changed: false,
                }))
            }
            Some(_) => {}
        }
    }

    let Some(image) = state.remote.lookup_image(&guid).await else {
        tracing::debug!(guid = %guid, "No image found");
        return Ok(Json(ImageResponse {
            image: None,
            changed: false,
        }));
    };

    let mut registry = state.registry.lock().await;
    let changed = registry.set_image(&guid, &image)?;

    Ok(Json(ImageResponse {
        image: Some(image),
        changed,
    }))
}

/// A marker popup was opened; let subscribers know.
async fn open_portal(
    State(state): State<Arc<AppState>>,
    Path(guid): Path<String>,
) -> Result<Json<Portal>> {
    let portal = {
        let registry = state.registry.lock().await;
        registry
            .get(&guid)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Portal {} not found", guid)))?
    };

    state.events.publish(DomainEvent::MarkerOpened {
        guid: portal.guid.clone(),
    });
    Ok(Json(portal))
}

// ─── Bulk Operations ─────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteResponse {
    pub removed: usize,
    pub total: usize,
}

/// Delete every portal of the given types. No types deletes nothing.
async fn delete_portals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TypesQuery>,
) -> Result<Json<DeleteResponse>> {
    let types = query.parse()?;

    let mut registry = state.registry.lock().await;
    let removed = registry.delete_by_types(&types)?;

    Ok(Json(DeleteResponse {
        removed,
        total: registry.len(),
    }))
}

/// Download portals of the given types as GeoJSON.
async fn export_portals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TypesQuery>,
) -> Result<impl IntoResponse> {
    let types = query.parse()?;
    let export = state.registry.lock().await.export_geojson(&types);

    tracing::info!(count = export.count, filename = %export.filename, "Exported portals");

    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        export.filename,
        urlencoding::encode(&export.filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/geo+json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    ))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImportResponse {
    pub imported: usize,
    pub total: usize,
}

/// Import a GeoJSON FeatureCollection. Existing guids are overwritten.
async fn import_portals(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ImportResponse>> {
    let text = std::str::from_utf8(&body)
        .map_err(|_| AppError::InvalidGeoJson("File is not valid UTF-8".to_string()))?;

    let mut registry = state.registry.lock().await;
    let imported = registry.import_geojson(text)?;

    Ok(Json(ImportResponse {
        imported,
        total: registry.len(),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FetchResponse {
    pub fetched: usize,
    pub added: usize,
    pub total: usize,
}

/// Pull every portal in the view from the remote directory. Known guids
/// are left alone.
async fn fetch_portals(
    State(state): State<Arc<AppState>>,
    Json(bounds): Json<ViewBounds>,
) -> Result<Json<FetchResponse>> {
    bounds.validate().map_err(AppError::BadRequest)?;

    let fetched = state.remote.fetch_portals_in_view(&bounds).await;
    let count = fetched.len();

    let mut registry = state.registry.lock().await;
    let added = registry.merge_remote(fetched)?;

    Ok(Json(FetchResponse {
        fetched: count,
        added,
        total: registry.len(),
    }))
}

// ─── Layers ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct LayersQuery {
    mode: Option<String>,
    /// Name filter
    q: Option<String>,
    /// Override the mode's clustering
    clustered: Option<bool>,
}

/// Marker layer membership for a mode and name filter.
async fn get_layers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LayersQuery>,
) -> Result<Json<LayersView>> {
    let mode = match query.mode.as_deref() {
        Some(raw) => raw.parse::<Mode>().map_err(AppError::BadRequest)?,
        None => Mode::default(),
    };

    let mut layers = MarkerLayers::new(mode);
    if let Some(clustered) = query.clustered {
        layers.set_clustering(clustered);
    }
    if let Some(q) = query.q.as_deref() {
        layers.set_filter(q);
    }

    let registry = state.registry.lock().await;
    layers.sync(registry.iter());

    Ok(Json(layers.view()))
}
