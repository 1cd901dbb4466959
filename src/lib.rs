// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Mushy-Map: a point-of-interest manager for survey and cook workflows
//!
//! This crate provides the backend API for keeping a registry of portals,
//! importing and exporting them as GeoJSON, tracking cooks, and projecting
//! when a depleting resource runs out.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{DurationCalculator, EventBus, PortalRegistry, RemoteClient, SearchSession};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state.
///
/// The registry lock is never held across a remote call.
pub struct AppState {
    pub config: Config,
    pub registry: Mutex<PortalRegistry>,
    pub remote: RemoteClient,
    pub events: EventBus,
    pub search: Mutex<SearchSession>,
    pub calculator: Arc<Mutex<DurationCalculator>>,
}

impl AppState {
    pub fn new(config: Config, registry: PortalRegistry, remote: RemoteClient, events: EventBus) -> Self {
        let mut calculator = DurationCalculator::new();
        calculator.set_zone(config.zone_offset_hours);

        Self {
            config,
            registry: Mutex::new(registry),
            remote,
            events,
            search: Mutex::new(SearchSession::new()),
            calculator: Arc::new(Mutex::new(calculator)),
        }
    }
}
