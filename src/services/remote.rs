// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the remote portal directory.
//!
//! Handles:
//! - Paginated bounding-box listing (terminated by a `-1` offset sentinel)
//! - Free-text search (50 results per page)
//! - Per-guid image lookup
//!
//! The directory is best effort. Failures are logged and turned into
//! "no results" by the `*_or_empty` style helpers; they never reach
//! registry logic.

use crate::config::Config;
use crate::error::AppError;
use crate::models::portal::{derive_manual, name_from_json};
use crate::models::{Portal, PortalType, ViewBounds};
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// `nextOffset` value that marks the last page.
pub const END_OF_PAGES: i64 = -1;

/// The search endpoint never returns more than this many results per page.
pub const SEARCH_PAGE_SIZE: usize = 50;

/// Remote directory client.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Create a client for the directory at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Remote(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            &config.remote_base_url,
            Duration::from_secs(config.remote_timeout_secs),
        )
    }

    /// Fetch one page of portals inside `bounds`.
    pub async fn fetch_page(
        &self,
        bounds: &ViewBounds,
        offset: i64,
    ) -> Result<PortalPage, AppError> {
        let url = format!("{}/getPortals.php", self.base_url);
        let mut query: Vec<(&str, String)> = bounds.query_pairs().to_vec();
        query.push(("offset", offset.to_string()));

        self.get_json(&url, &query).await
    }

    /// Fetch every page of portals inside `bounds`.
    ///
    /// Returns whatever was accumulated if a page fails.
    pub async fn fetch_portals_in_view(&self, bounds: &ViewBounds) -> Vec<RemotePortal> {
        let bounds = ViewBounds::from_rect(bounds.to_rect());
        collect_pages(|offset| self.fetch_page(&bounds, offset)).await
    }

    /// Search portals by name or address.
    pub async fn search(&self, query: &str, offset: usize) -> Result<Vec<SearchResult>, AppError> {
        let url = format!("{}/searchPortals.php", self.base_url);
        let results: Option<Vec<SearchResult>> = self
            .get_json(
                &url,
                &[("query", query.to_string()), ("offset", offset.to_string())],
            )
            .await?;

        Ok(results.unwrap_or_default())
    }

    /// Search, treating any failure as an empty page.
    pub async fn search_or_empty(&self, query: &str, offset: usize) -> Vec<SearchResult> {
        match self.search(query, offset).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, query, offset, "Portal search failed");
                Vec::new()
            }
        }
    }

    /// Look up a portal's image. `None` means no image was found.
    pub async fn lookup_image(&self, guid: &str) -> Option<String> {
        let results = match self.search(guid, 0).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, guid, "Image lookup failed");
                return None;
            }
        };

        results
            .into_iter()
            .find(|r| r.guid == guid)
            .map(|r| r.image)
            .filter(|image| !image.is_empty())
    }

    /// GET with query parameters and a JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("JSON parse error: {}", e)))
    }
}

/// Drive a paginated listing from offset 0 until the end sentinel.
///
/// One page is in flight at a time. A failed page, or a page whose next
/// offset does not move forward, ends the walk early.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> Vec<RemotePortal>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<PortalPage, AppError>>,
{
    let mut offset = 0;
    let mut portals = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = match fetch_page(offset).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(error = %e, offset, "Failed to fetch portal page");
                break;
            }
        };
        pages += 1;
        portals.extend(page.portal_data);

        if page.next_offset == END_OF_PAGES {
            break;
        }
        if page.next_offset <= offset {
            tracing::warn!(
                offset,
                next_offset = page.next_offset,
                "Portal listing did not advance, stopping"
            );
            break;
        }
        offset = page.next_offset;
    }

    tracing::info!(pages, count = portals.len(), "Fetched portals in view");
    portals
}

fn lenient_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(name_from_json(&value).unwrap_or_default())
}

/// One page of the bounding-box listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalPage {
    pub next_offset: i64,
    #[serde(default)]
    pub portal_data: Vec<RemotePortal>,
}

/// Portal as listed by the directory.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePortal {
    pub guid: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub portal_type: Option<PortalType>,
}

impl RemotePortal {
    /// Candidate portal for the registry; type defaults to `Unknown`.
    pub fn into_portal(self) -> Portal {
        let manual = derive_manual(&self.guid);
        let name = if self.name.is_empty() {
            self.guid.clone()
        } else {
            self.name
        };

        Portal {
            name,
            lat: self.lat,
            lng: self.lng,
            portal_type: self.portal_type.unwrap_or(PortalType::Unknown),
            image: None,
            cooks: None,
            manual,
            guid: self.guid,
        }
    }
}

/// Search hit from the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchResult {
    pub guid: String,
    #[serde(default)]
    pub image: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

impl SearchResult {
    /// Portal to save when the user keeps a search hit.
    pub fn into_portal(self, portal_type: PortalType) -> Portal {
        let manual = derive_manual(&self.guid);
        Portal {
            name: if self.name.is_empty() {
                self.guid.clone()
            } else {
                self.name
            },
            lat: self.lat,
            lng: self.lng,
            portal_type,
            image: Some(self.image).filter(|i| !i.is_empty()),
            cooks: None,
            manual,
            guid: self.guid,
        }
    }
}
