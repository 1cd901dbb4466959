// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calculator;
pub mod cooking;
pub mod duration;
pub mod events;
pub mod interchange;
pub mod layers;
pub mod registry;
pub mod remote;
pub mod search;

pub use calculator::{CalculatorView, DurationCalculator, LiveTicker};
pub use events::{DomainEvent, EventBus};
pub use layers::{MarkerLayer, MarkerLayers, Mode};
pub use registry::{CookOutcome, ExportFile, PortalRegistry};
pub use remote::{RemoteClient, RemotePortal, SearchResult};
pub use search::SearchSession;
