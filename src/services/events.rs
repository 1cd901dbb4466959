// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed publish/subscribe bus for domain notifications.
//!
//! Notifications are fire-and-forget: publishing never waits for, or
//! fails because of, subscribers. A subscriber that falls too far behind
//! loses the oldest events.

use serde::Serialize;
use tokio::sync::broadcast;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const EVENT_BUFFER: usize = 64;

/// Something observers of the registry may want to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Portals were added or replaced by a merge.
    PortalsChanged { count: usize },
    /// A marker's popup was opened.
    MarkerOpened { guid: String },
}

impl DomainEvent {
    /// Event name used on the SSE stream.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::PortalsChanged { .. } => "portals-changed",
            DomainEvent::MarkerOpened { .. } => "marker-open",
        }
    }
}

/// Broadcast bus handle. Clones publish to the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        tracing::debug!(event = event.name(), "Publishing domain event");
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}
