// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use mushy_map::config::Config;
use mushy_map::db::LocalStore;
use mushy_map::routes::create_router;
use mushy_map::services::{EventBus, PortalRegistry, RemoteClient};
use mushy_map::AppState;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Create a test app with an in-memory store and an unreachable remote.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    build_app(config, LocalStore::new_mock())
}

/// Create a test app that talks to the given remote directory.
#[allow(dead_code)]
pub fn create_test_app_with_remote(base_url: &str) -> (axum::Router, Arc<AppState>) {
    let config = Config {
        remote_base_url: base_url.to_string(),
        ..Config::test_default()
    };
    build_app(config, LocalStore::new_mock())
}

#[allow(dead_code)]
pub fn build_app(config: Config, store: LocalStore) -> (axum::Router, Arc<AppState>) {
    let events = EventBus::new();
    let registry =
        PortalRegistry::load(store, events.clone()).expect("Failed to load registry");
    let remote = RemoteClient::new(&config.remote_base_url, Duration::from_secs(5))
        .expect("Failed to build remote client");

    let state = Arc::new(AppState::new(config, registry, remote, events));
    (create_router(state.clone()), state)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// A stand-in for the remote portal directory.
#[allow(dead_code)]
pub struct MockRemote {
    pub base_url: String,
    pub page_requests: Arc<AtomicUsize>,
    pub offsets: Arc<Mutex<Vec<i64>>>,
}

#[derive(Deserialize)]
struct PageQuery {
    offset: i64,
}

#[derive(Deserialize)]
struct SearchQuery {
    query: String,
    #[serde(default)]
    offset: usize,
}

fn listed(guid: &str, name: serde_json::Value) -> serde_json::Value {
    json!({"guid": guid, "lat": 37.4, "lng": -122.1, "name": name})
}

/// Serve the mock directory on an ephemeral port.
///
/// Listing pages are at offsets 0, 50 and 100 (five portals in all).
/// Any other offset fails with a 500. Search knows a few fixed queries.
#[allow(dead_code)]
pub async fn spawn_mock_remote() -> MockRemote {
    let page_requests = Arc::new(AtomicUsize::new(0));
    let offsets = Arc::new(Mutex::new(Vec::new()));

    let counter = page_requests.clone();
    let seen = offsets.clone();
    let get_portals = move |Query(query): Query<PageQuery>| {
        let counter = counter.clone();
        let seen = seen.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push(query.offset);

            let page = match query.offset {
                0 => json!({"nextOffset": 50, "portalData": [
                    listed("a.16", json!("Fountain")),
                    listed("b.16", json!("Mural")),
                ]}),
                50 => json!({"nextOffset": 100, "portalData": [
                    listed("c.16", json!(1234)),
                    listed("d.12", json!("Bench")),
                ]}),
                100 => json!({"nextOffset": -1, "portalData": [
                    listed("e.16", json!("Gazebo")),
                ]}),
                _ => return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
            };
            Json(page).into_response()
        }
    };

    let search_portals = |Query(query): Query<SearchQuery>| async move {
        let results = match query.query.as_str() {
            "park" if query.offset == 0 => serde_json::Value::Array(
                (0..50)
                    .map(|i| {
                        json!({"guid": format!("park{}.16", i), "image": "", "lat": 1.0,
                               "lng": 2.0, "name": format!("Park {}", i), "address": "Main St"})
                    })
                    .collect(),
            ),
            "park" => json!([
                {"guid": "park50.16", "image": "", "lat": 1.0, "lng": 2.0, "name": "Park 50", "address": "Main St"}
            ]),
            "a.16" => json!([
                {"guid": "other.16", "image": "http://img/other.jpg", "lat": 0, "lng": 0, "name": "Other", "address": ""},
                {"guid": "a.16", "image": "http://img/a.jpg", "lat": 0, "lng": 0, "name": "Fountain", "address": ""}
            ]),
            _ => serde_json::Value::Null,
        };
        Json(results)
    };

    let app = Router::new()
        .route("/getPortals.php", get(get_portals))
        .route("/searchPortals.php", get(search_portals));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock remote");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    MockRemote {
        base_url: format!("http://{}", addr),
        page_requests,
        offsets,
    }
}

/// Minimal GeoJSON document with the given `(guid, type, manual)` points.
#[allow(dead_code)]
pub fn feature_collection(portals: &[(&str, &str, Option<bool>)]) -> String {
    let features: Vec<serde_json::Value> = portals
        .iter()
        .map(|(guid, portal_type, manual)| {
            let mut properties: HashMap<&str, serde_json::Value> = HashMap::new();
            properties.insert("guid", json!(guid));
            properties.insert("name", json!(format!("Portal {}", guid)));
            properties.insert("type", json!(portal_type));
            if let Some(manual) = manual {
                properties.insert("manual", json!(manual));
            }
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-122.1, 37.4]},
                "properties": properties,
            })
        })
        .collect();

    json!({"type": "FeatureCollection", "features": features}).to_string()
}
