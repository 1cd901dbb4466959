// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Marker layer view-model: which portal markers belong to which per-type
//! layer, and whether those layers cluster.
//!
//! A layer is either clustered or flat. Both kinds take markers in bulk
//! through the same `add_many`/`remove_many` calls, so callers never need
//! to know which kind they hold.

use crate::models::{Portal, PortalType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Clustering parameters shared by every clustered layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOptions {
    pub disable_clustering_at_zoom: u8,
    pub max_cluster_radius: u32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            disable_clustering_at_zoom: 17,
            max_cluster_radius: 50,
        }
    }
}

/// Workflow the map is used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every type visible, markers clustered.
    #[default]
    Survey,
    /// Only mushrooms visible, no clustering.
    Cook,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Survey => "survey",
            Mode::Cook => "cook",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "survey" => Ok(Mode::Survey),
            "cook" => Ok(Mode::Cook),
            other => Err(format!("Unknown mode '{}'", other)),
        }
    }
}

/// A group of markers, identified by portal guid.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerLayer {
    Clustered {
        options: ClusterOptions,
        members: BTreeSet<String>,
    },
    Flat {
        members: BTreeSet<String>,
    },
}

impl MarkerLayer {
    pub fn new(clustered: bool) -> Self {
        if clustered {
            MarkerLayer::Clustered {
                options: ClusterOptions::default(),
                members: BTreeSet::new(),
            }
        } else {
            MarkerLayer::Flat {
                members: BTreeSet::new(),
            }
        }
    }

    pub fn is_clustered(&self) -> bool {
        matches!(self, MarkerLayer::Clustered { .. })
    }

    pub fn members(&self) -> &BTreeSet<String> {
        match self {
            MarkerLayer::Clustered { members, .. } | MarkerLayer::Flat { members } => members,
        }
    }

    fn members_mut(&mut self) -> &mut BTreeSet<String> {
        match self {
            MarkerLayer::Clustered { members, .. } | MarkerLayer::Flat { members } => members,
        }
    }

    pub fn add_many<I: IntoIterator<Item = String>>(&mut self, guids: I) {
        self.members_mut().extend(guids);
    }

    pub fn remove_many<'a, I: IntoIterator<Item = &'a String>>(&mut self, guids: I) {
        let members = self.members_mut();
        for guid in guids {
            members.remove(guid);
        }
    }

    /// The same markers in a layer of the other kind.
    pub fn rebuilt(self, clustered: bool) -> Self {
        if self.is_clustered() == clustered {
            return self;
        }

        let members = match self {
            MarkerLayer::Clustered { members, .. } | MarkerLayer::Flat { members } => members,
        };
        let mut layer = MarkerLayer::new(clustered);
        layer.add_many(members);
        layer
    }
}

/// One layer per portal type, plus visibility and the name filter.
#[derive(Debug, Clone)]
pub struct MarkerLayers {
    layers: BTreeMap<PortalType, MarkerLayer>,
    visible: BTreeSet<PortalType>,
    mode: Mode,
    clustering: bool,
    filter: Option<String>,
}

impl Default for MarkerLayers {
    fn default() -> Self {
        Self::new(Mode::Survey)
    }
}

impl MarkerLayers {
    pub fn new(mode: Mode) -> Self {
        let mut layers = Self {
            layers: PortalType::ALL
                .into_iter()
                .map(|t| (t, MarkerLayer::new(true)))
                .collect(),
            visible: BTreeSet::new(),
            mode,
            clustering: true,
            filter: None,
        };
        layers.set_mode(mode);
        layers
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn clustering(&self) -> bool {
        self.clustering
    }

    pub fn layer(&self, portal_type: PortalType) -> Option<&MarkerLayer> {
        self.layers.get(&portal_type)
    }

    pub fn is_visible(&self, portal_type: PortalType) -> bool {
        self.visible.contains(&portal_type)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        match mode {
            Mode::Survey => {
                self.visible = PortalType::ALL.into_iter().collect();
                self.set_clustering(true);
            }
            Mode::Cook => {
                self.visible = [PortalType::Mushroom].into_iter().collect();
                self.set_clustering(false);
            }
        }
        tracing::debug!(mode = %mode, "Switched map mode");
    }

    /// Rebuild every layer as clustered or flat, keeping its markers.
    pub fn set_clustering(&mut self, clustering: bool) {
        self.clustering = clustering;
        self.layers = std::mem::take(&mut self.layers)
            .into_iter()
            .map(|(t, layer)| (t, layer.rebuilt(clustering)))
            .collect();
    }

    pub fn toggle_clustering(&mut self) {
        self.set_clustering(!self.clustering);
    }

    /// Filter markers by name. Blank clears the filter.
    pub fn set_filter(&mut self, query: &str) {
        let query = query.trim();
        self.filter = if query.is_empty() {
            None
        } else {
            Some(query.to_lowercase())
        };
    }

    /// Case-insensitive literal substring match against the filter.
    pub fn matches(&self, name: &str) -> bool {
        match &self.filter {
            Some(filter) => name.to_lowercase().contains(filter.as_str()),
            None => true,
        }
    }

    /// Bring layer membership in line with the given portals.
    pub fn sync<'a, I>(&mut self, portals: I)
    where
        I: IntoIterator<Item = &'a Portal>,
    {
        let mut wanted: BTreeMap<PortalType, BTreeSet<String>> = BTreeMap::new();
        for portal in portals {
            if self.matches(&portal.name) {
                wanted
                    .entry(portal.portal_type)
                    .or_default()
                    .insert(portal.guid.clone());
            }
        }

        for (portal_type, layer) in self.layers.iter_mut() {
            let want = wanted.remove(portal_type).unwrap_or_default();
            let stale: Vec<String> = layer
                .members()
                .iter()
                .filter(|g| !want.contains(*g))
                .cloned()
                .collect();
            layer.remove_many(&stale);
            layer.add_many(want);
        }
    }

    pub fn view(&self) -> LayersView {
        LayersView {
            mode: self.mode,
            clustering: self.clustering,
            filter: self.filter.clone(),
            layers: self
                .layers
                .iter()
                .map(|(portal_type, layer)| LayerView {
                    portal_type: *portal_type,
                    visible: self.is_visible(*portal_type),
                    cluster_options: match layer {
                        MarkerLayer::Clustered { options, .. } => Some(*options),
                        MarkerLayer::Flat { .. } => None,
                    },
                    markers: layer.members().iter().cloned().collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LayerView {
    #[serde(rename = "type")]
    pub portal_type: PortalType,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_options: Option<ClusterOptions>,
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LayersView {
    pub mode: Mode,
    pub clustering: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub layers: Vec<LayerView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portal(guid: &str, name: &str, portal_type: PortalType) -> Portal {
        Portal {
            guid: guid.to_string(),
            lat: 0.0,
            lng: 0.0,
            name: name.to_string(),
            portal_type,
            image: None,
            cooks: None,
            manual: true,
        }
    }

    #[test]
    fn test_modes() {
        let mut layers = MarkerLayers::new(Mode::Survey);
        assert!(layers.clustering());
        assert!(PortalType::ALL.into_iter().all(|t| layers.is_visible(t)));

        layers.set_mode(Mode::Cook);
        assert!(!layers.clustering());
        assert!(layers.is_visible(PortalType::Mushroom));
        assert!(!layers.is_visible(PortalType::Flower));
        assert!(!layers.layer(PortalType::Mushroom).unwrap().is_clustered());
    }

    #[test]
    fn test_toggle_keeps_members() {
        let mut layers = MarkerLayers::default();
        let portals = [portal("a", "Alpha", PortalType::Flower)];
        layers.sync(&portals);

        layers.toggle_clustering();
        let layer = layers.layer(PortalType::Flower).unwrap();
        assert!(!layer.is_clustered());
        assert!(layer.members().contains("a"));
    }

    #[test]
    fn test_filter_is_literal_and_case_insensitive() {
        let mut layers = MarkerLayers::default();
        let portals = [
            portal("a", "Big Fountain", PortalType::Flower),
            portal("b", "Mural (north)", PortalType::Mushroom),
            portal("c", "Bench", PortalType::Mushroom),
        ];

        layers.set_filter("FOUNT");
        layers.sync(&portals);
        assert!(layers.layer(PortalType::Flower).unwrap().members().contains("a"));
        assert!(layers.layer(PortalType::Mushroom).unwrap().members().is_empty());

        layers.set_filter("(north");
        layers.sync(&portals);
        assert!(layers.layer(PortalType::Flower).unwrap().members().is_empty());
        assert_eq!(layers.layer(PortalType::Mushroom).unwrap().members().len(), 1);

        layers.set_filter("  ");
        layers.sync(&portals);
        assert_eq!(layers.layer(PortalType::Mushroom).unwrap().members().len(), 2);
    }

    #[test]
    fn test_sync_moves_retyped_marker() {
        let mut layers = MarkerLayers::default();
        layers.sync(&[portal("a", "Alpha", PortalType::Unknown)]);
        layers.sync(&[portal("a", "Alpha", PortalType::Mushroom)]);

        assert!(layers.layer(PortalType::Unknown).unwrap().members().is_empty());
        assert!(layers.layer(PortalType::Mushroom).unwrap().members().contains("a"));
    }
}
