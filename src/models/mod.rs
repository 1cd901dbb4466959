// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod bounds;
pub mod cook;
pub mod portal;

pub use bounds::ViewBounds;
pub use cook::{Cook, CookSize, CookType};
pub use portal::{Portal, PortalType, StoredPortal};
