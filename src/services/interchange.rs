// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GeoJSON import and export of portals.
//!
//! Imports are parsed completely before anything is returned, so a bad
//! file never leaves the registry half-updated.

use crate::error::AppError;
use crate::models::portal::{derive_manual, name_from_json, new_guid};
use crate::models::{Cook, Portal, PortalType};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Filename used when every portal is exported.
pub const DEFAULT_EXPORT_FILENAME: &str = "markers.geojson";

/// Properties an imported feature may carry.
#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    name: Option<serde_json::Value>,
    #[serde(rename = "type", default)]
    portal_type: Option<PortalType>,
    #[serde(default)]
    guid: Option<String>,
    #[serde(default)]
    cooks: Option<Vec<Cook>>,
    #[serde(default)]
    manual: Option<bool>,
}

/// Parse a GeoJSON document into portals.
///
/// Features that are not points or carry no properties are skipped.
pub fn parse_feature_collection(text: &str) -> Result<Vec<Portal>, AppError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| AppError::InvalidGeoJson(e.to_string()))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(AppError::InvalidGeoJson(
            "Invalid GeoJSON format: expected a FeatureCollection".to_string(),
        ));
    };

    let mut portals = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for (index, feature) in collection.features.into_iter().enumerate() {
        match portal_from_feature(feature, index)? {
            Some(portal) => portals.push(portal),
            None => skipped += 1,
        }
    }

    tracing::info!(count = portals.len(), skipped, "Parsed GeoJSON import");
    Ok(portals)
}

fn portal_from_feature(feature: Feature, index: usize) -> Result<Option<Portal>, AppError> {
    let Some(properties) = feature.properties else {
        return Ok(None);
    };

    let position = match feature.geometry.map(|g| g.value) {
        Some(geojson::Value::Point(position)) => position,
        _ => return Ok(None),
    };

    let (Some(&lng), Some(&lat)) = (position.first(), position.get(1)) else {
        return Err(AppError::InvalidGeoJson(format!(
            "Feature {} has an incomplete coordinate",
            index
        )));
    };

    let props: FeatureProperties =
        serde_json::from_value(serde_json::Value::Object(properties)).map_err(|e| {
            AppError::InvalidGeoJson(format!("Feature {} has invalid properties: {}", index, e))
        })?;

    let guid = match props.guid.filter(|g| !g.is_empty()) {
        Some(guid) => guid,
        None => new_guid()?,
    };
    let name = props
        .name
        .as_ref()
        .and_then(name_from_json)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| guid.clone());
    let manual = props.manual.unwrap_or_else(|| derive_manual(&guid));

    Ok(Some(Portal {
        name,
        lat,
        lng,
        portal_type: props.portal_type.unwrap_or(PortalType::Unknown),
        image: None,
        cooks: props.cooks,
        manual,
        guid,
    }))
}

/// Build a FeatureCollection of the given portals (coordinates `[lng, lat]`).
pub fn to_feature_collection<'a, I>(portals: I) -> FeatureCollection
where
    I: IntoIterator<Item = &'a Portal>,
{
    let features = portals
        .into_iter()
        .map(|portal| {
            let mut properties = serde_json::Map::new();
            properties.insert("name".into(), portal.name.clone().into());
            properties.insert("type".into(), portal.portal_type.as_str().into());
            properties.insert("guid".into(), portal.guid.clone().into());
            if let Some(cooks) = &portal.cooks {
                properties.insert(
                    "cooks".into(),
                    serde_json::to_value(cooks).unwrap_or(serde_json::Value::Null),
                );
            }
            properties.insert("manual".into(), portal.manual.into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::Point(vec![
                    portal.lng, portal.lat,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// True when a selection means "all portals": nothing or everything picked.
pub fn selects_everything(types: &BTreeSet<PortalType>) -> bool {
    types.is_empty() || types.len() == PortalType::ALL.len()
}

/// Download filename for an export of the selected types.
pub fn export_filename(types: &BTreeSet<PortalType>) -> String {
    if selects_everything(types) {
        return DEFAULT_EXPORT_FILENAME.to_string();
    }

    let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
    format!("{}.geojson", names.join(","))
}
