// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The portal registry: canonical guid → portal map with write-through
//! persistence.
//!
//! Every mutating operation saves the whole registry before returning. If
//! the save fails the in-memory change is rolled back, so memory never
//! holds state the store does not.
//! Operations addressed to a guid that no longer exists are no-ops and
//! report `false`/`None` rather than an error; a portal may disappear
//! while a remote lookup for it is still in flight.

use crate::db::{keys, LocalStore};
use crate::error::AppError;
use crate::models::portal::new_guid;
use crate::models::{Cook, CookSize, CookType, Portal, PortalType, StoredPortal};
use crate::services::events::{DomainEvent, EventBus};
use crate::services::interchange;
use crate::services::remote::RemotePortal;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// A GeoJSON document ready for download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub body: String,
    pub count: usize,
}

/// Fields of a finished (or edited) cook.
#[derive(Debug, Clone)]
pub struct CookOutcome {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub safe: bool,
    pub note: Option<String>,
}

/// Owned collection of all portals.
pub struct PortalRegistry {
    portals: HashMap<String, Portal>,
    store: LocalStore,
    events: EventBus,
}

impl PortalRegistry {
    /// Load the registry from storage.
    ///
    /// A corrupt stored value is logged and treated as an empty registry.
    /// Only a failure to read the store at all is an error.
    pub fn load(store: LocalStore, events: EventBus) -> Result<Self, AppError> {
        let raw = store
            .get(keys::PORTALS)?
            .unwrap_or_else(|| "[]".to_string());

        let stored: Vec<StoredPortal> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Stored portals are unreadable, starting empty");
                Vec::new()
            }
        };

        let portals: HashMap<String, Portal> = stored
            .into_iter()
            .map(StoredPortal::normalize)
            .map(|p| (p.guid.clone(), p))
            .collect();

        tracing::info!(count = portals.len(), "Loaded portals");

        Ok(Self {
            portals,
            store,
            events,
        })
    }

    /// Persist every portal, overwriting the previous value.
    pub fn save(&self) -> Result<(), AppError> {
        let all: Vec<&Portal> = self.portals.values().collect();
        let json = serde_json::to_string(&all)
            .map_err(|e| AppError::Storage(format!("Failed to serialize portals: {}", e)))?;
        self.store.set(keys::PORTALS, &json)
    }

    pub fn get(&self, guid: &str) -> Option<&Portal> {
        self.portals.get(guid)
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.portals.contains_key(guid)
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Portal> {
        self.portals.values()
    }

    /// All portals sorted by name, then guid.
    pub fn list(&self) -> Vec<&Portal> {
        let mut portals: Vec<&Portal> = self.portals.values().collect();
        portals.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.guid.cmp(&b.guid)));
        portals
    }

    // ─── Merges ──────────────────────────────────────────────────

    /// Merge portals from the remote directory. Known guids are skipped so
    /// local edits survive repeated polling. Returns how many were added.
    pub fn merge_remote(&mut self, fetched: Vec<RemotePortal>) -> Result<usize, AppError> {
        let snapshot = self.portals.clone();
        let mut added = 0;

        for remote in fetched {
            if self.portals.contains_key(&remote.guid) {
                continue;
            }

            let portal = remote.into_portal();
            self.portals.insert(portal.guid.clone(), portal);
            added += 1;
        }

        self.commit(snapshot)?;
        tracing::info!(added, total = self.portals.len(), "Merged remote portals");
        self.events
            .publish(DomainEvent::PortalsChanged { count: added });
        Ok(added)
    }

    /// Import a GeoJSON document. Known guids are replaced wholesale.
    ///
    /// The document is parsed in full first; on error nothing changes.
    pub fn import_geojson(&mut self, text: &str) -> Result<usize, AppError> {
        let imported = interchange::parse_feature_collection(text)?;
        let count = imported.len();
        let snapshot = self.portals.clone();

        for portal in imported {
            if let Some(previous) = self.portals.insert(portal.guid.clone(), portal) {
                tracing::debug!(guid = %previous.guid, "Import replaced existing portal");
            }
        }

        self.commit(snapshot)?;
        tracing::info!(count, total = self.portals.len(), "Imported portals");
        self.events.publish(DomainEvent::PortalsChanged { count });
        Ok(count)
    }

    // ─── Export / Delete ─────────────────────────────────────────

    /// Export portals of the selected types; an empty selection or every
    /// type means all portals.
    pub fn export_geojson(&self, types: &[PortalType]) -> ExportFile {
        let selected: BTreeSet<PortalType> = types.iter().copied().collect();
        let everything = interchange::selects_everything(&selected);

        let portals: Vec<&Portal> = self
            .list()
            .into_iter()
            .filter(|p| everything || selected.contains(&p.portal_type))
            .collect();
        let count = portals.len();

        let collection = interchange::to_feature_collection(portals);
        let body = geojson::GeoJson::from(collection).to_string();

        ExportFile {
            filename: interchange::export_filename(&selected),
            body,
            count,
        }
    }

    /// Remove every portal whose type is selected. An empty selection
    /// deletes nothing. Returns the number removed.
    pub fn delete_by_types(&mut self, types: &[PortalType]) -> Result<usize, AppError> {
        if types.is_empty() {
            return Ok(0);
        }

        let snapshot = self.portals.clone();
        self.portals.retain(|_, p| !types.contains(&p.portal_type));
        let removed = snapshot.len() - self.portals.len();

        self.commit(snapshot)?;
        tracing::info!(removed, types = ?types, "Deleted portals by type");
        Ok(removed)
    }

    // ─── Single Portal Operations ────────────────────────────────

    /// Add a hand-placed portal. A blank name falls back to the new guid.
    pub fn create_manual(
        &mut self,
        lat: f64,
        lng: f64,
        name: Option<&str>,
        portal_type: PortalType,
    ) -> Result<Portal, AppError> {
        let guid = new_guid()?;
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| guid.clone());

        let portal = Portal {
            guid: guid.clone(),
            lat,
            lng,
            name,
            portal_type,
            image: None,
            cooks: None,
            manual: true,
        };
        self.put(portal.clone())?;

        tracing::info!(guid = %portal.guid, portal_type = %portal_type, "Created manual portal");
        Ok(portal)
    }

    /// Insert or replace a single portal, e.g. a saved search result.
    pub fn upsert(&mut self, portal: Portal) -> Result<(), AppError> {
        self.put(portal)
    }

    pub fn set_type(&mut self, guid: &str, portal_type: PortalType) -> Result<bool, AppError> {
        self.modify(guid, |p| {
            p.portal_type = portal_type;
            true
        })
    }

    pub fn set_image(&mut self, guid: &str, image: &str) -> Result<bool, AppError> {
        self.modify(guid, |p| {
            p.image = Some(image.to_string());
            true
        })
    }

    // ─── Cooks ───────────────────────────────────────────────────

    /// Start a cook at `now` (truncated to the minute). Refused while
    /// another cook on the portal is ongoing.
    pub fn start_cook(
        &mut self,
        guid: &str,
        size: CookSize,
        cook_type: CookType,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        self.modify(guid, |p| {
            if !p.is_cookable() {
                return false;
            }
            p.cooks.get_or_insert_with(Vec::new).push(Cook {
                size,
                cook_type,
                start: crate::time_utils::round_to_minute(now),
                end: None,
                safe: true,
                note: None,
            });
            true
        })
    }

    /// Finish the ongoing cook. No-op when nothing is cooking.
    pub fn finish_cook(&mut self, guid: &str, outcome: CookOutcome) -> Result<bool, AppError> {
        self.modify(guid, |p| match p.ongoing_cook_mut() {
            Some(cook) => {
                apply_outcome(cook, outcome);
                true
            }
            None => false,
        })
    }

    /// Rewrite a finished cook in the portal's history.
    pub fn edit_cook(
        &mut self,
        guid: &str,
        index: usize,
        outcome: CookOutcome,
    ) -> Result<bool, AppError> {
        self.modify(guid, |p| {
            match p.cooks.as_mut().and_then(|c| c.get_mut(index)) {
                Some(cook) if !cook.is_ongoing() => {
                    apply_outcome(cook, outcome);
                    true
                }
                _ => false,
            }
        })
    }

    /// Drop a cook from the history (also used to abandon an ongoing one).
    pub fn remove_cook(&mut self, guid: &str, index: usize) -> Result<bool, AppError> {
        self.modify(guid, |p| match p.cooks.as_mut() {
            Some(cooks) if index < cooks.len() => {
                cooks.remove(index);
                true
            }
            _ => false,
        })
    }

    /// Apply `change` to a portal and save if it reports a modification.
    fn modify<F>(&mut self, guid: &str, change: F) -> Result<bool, AppError>
    where
        F: FnOnce(&mut Portal) -> bool,
    {
        let Some(portal) = self.portals.get_mut(guid) else {
            tracing::debug!(guid, "Ignoring update for missing portal");
            return Ok(false);
        };

        let previous = portal.clone();
        if !change(portal) {
            return Ok(false);
        }

        if let Err(e) = self.save() {
            self.portals.insert(guid.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    /// Insert one portal and save, undoing the insert if the save fails.
    fn put(&mut self, portal: Portal) -> Result<(), AppError> {
        let guid = portal.guid.clone();
        let replaced = self.portals.insert(guid.clone(), portal);

        if let Err(e) = self.save() {
            match replaced {
                Some(old) => self.portals.insert(guid, old),
                None => self.portals.remove(&guid),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Save, or restore `snapshot` if the save fails.
    fn commit(&mut self, snapshot: HashMap<String, Portal>) -> Result<(), AppError> {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "Rolling back unsaved registry change");
            self.portals = snapshot;
            return Err(e);
        }
        Ok(())
    }
}

fn apply_outcome(cook: &mut Cook, outcome: CookOutcome) {
    cook.start = outcome.start;
    cook.end = Some(outcome.end);
    cook.safe = outcome.safe;
    cook.note = outcome
        .note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
}
