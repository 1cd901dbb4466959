// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Portal model and storage normalization.

use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::AppError;
use crate::models::cook::Cook;

/// Guids from the external directory that end in this suffix were not
/// placed by hand. The suffix comes from the directory's id scheme.
pub const DIRECTORY_GUID_SUFFIX: &str = ".16";

/// Category tag of a portal, controlling which layer it is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PortalType {
    #[serde(alias = "flower")]
    Flower,
    #[serde(alias = "mushroom")]
    Mushroom,
    #[serde(alias = "unavailable")]
    Unavailable,
    #[serde(alias = "unknown", other)]
    Unknown,
}

impl PortalType {
    /// All types, in display order.
    pub const ALL: [PortalType; 4] = [
        PortalType::Flower,
        PortalType::Mushroom,
        PortalType::Unavailable,
        PortalType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PortalType::Flower => "Flower",
            PortalType::Mushroom => "Mushroom",
            PortalType::Unavailable => "Unavailable",
            PortalType::Unknown => "Unknown",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PortalType::Flower => "🌼",
            PortalType::Mushroom => "🍄",
            PortalType::Unavailable => "✖",
            PortalType::Unknown => "❔",
        }
    }
}

impl fmt::Display for PortalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortalType {
    type Err = String;

    /// Strict, case-insensitive parse used for query parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PortalType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown portal type '{}'", s))
    }
}

/// Parse a comma separated list of portal types (`"Flower,Mushroom"`).
pub fn parse_type_list(raw: &str) -> Result<Vec<PortalType>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PortalType::from_str)
        .collect()
}

/// A point of interest on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Portal {
    pub guid: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub portal_type: PortalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooks: Option<Vec<Cook>>,
    pub manual: bool,
}

impl Portal {
    /// Whether a new cook may be started (no cook is ongoing).
    pub fn is_cookable(&self) -> bool {
        self.cooks
            .as_ref()
            .map_or(true, |cooks| cooks.iter().all(|c| !c.is_ongoing()))
    }

    /// The first ongoing cook, if any.
    pub fn ongoing_cook_mut(&mut self) -> Option<&mut Cook> {
        self.cooks
            .as_mut()
            .and_then(|cooks| cooks.iter_mut().find(|c| c.is_ongoing()))
    }
}

/// Generate a fresh random (version 4) UUID string for a new portal.
pub fn new_guid() -> Result<String, AppError> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System random source unavailable")))?;
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex = hex::encode(bytes);
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}

/// Names sometimes arrive as JSON numbers; render any scalar as text.
pub fn name_from_json(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Default for records that carry no explicit `manual` flag.
pub fn derive_manual(guid: &str) -> bool {
    !guid.ends_with(DIRECTORY_GUID_SUFFIX)
}

/// A portal as found in storage, possibly written by an older version.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredPortal {
    pub guid: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub portal_type: Option<PortalType>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub cooks: Option<Vec<Cook>>,
    #[serde(default)]
    pub manual: Option<bool>,
}

impl StoredPortal {
    /// Fill in everything legacy records may lack.
    pub fn normalize(self) -> Portal {
        let manual = self.manual.unwrap_or_else(|| derive_manual(&self.guid));
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.guid.clone());

        Portal {
            name,
            portal_type: self.portal_type.unwrap_or(PortalType::Unknown),
            image: self.image,
            cooks: self.cooks,
            manual,
            lat: self.lat,
            lng: self.lng,
            guid: self.guid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_type_accepts_lowercase_and_unknown_values() {
        let parsed: Vec<PortalType> =
            serde_json::from_str(r#"["Flower", "mushroom", "Tree", "Unavailable"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                PortalType::Flower,
                PortalType::Mushroom,
                PortalType::Unknown,
                PortalType::Unavailable
            ]
        );
    }

    #[test]
    fn test_parse_type_list() {
        assert_eq!(
            parse_type_list("flower, Mushroom").unwrap(),
            vec![PortalType::Flower, PortalType::Mushroom]
        );
        assert!(parse_type_list("").unwrap().is_empty());
        assert!(parse_type_list("Flower,Tree").is_err());
    }

    #[test]
    fn test_manual_heuristic() {
        assert!(!derive_manual("abcdef0123.16"));
        assert!(derive_manual("abcdef0123.12"));
        assert!(derive_manual("5f0c3f9e-2a53-4d7e-9a0c-51c1c0b0d1aa"));
    }

    #[test]
    fn test_new_guid_shape() {
        let guid = new_guid().unwrap();
        assert_eq!(guid.len(), 36);
        assert_eq!(guid.as_bytes()[14], b'4');
        assert!(derive_manual(&guid));
        assert_ne!(guid, new_guid().unwrap());
    }

    #[test]
    fn test_name_from_json() {
        assert_eq!(name_from_json(&serde_json::json!(1234)).as_deref(), Some("1234"));
        assert_eq!(name_from_json(&serde_json::json!("Fountain")).as_deref(), Some("Fountain"));
        assert_eq!(name_from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_normalize_legacy_record() {
        let stored: StoredPortal =
            serde_json::from_str(r#"{"guid": "abc.16", "lat": 1.5, "lng": 2.5}"#).unwrap();
        let portal = stored.normalize();

        assert_eq!(portal.name, "abc.16");
        assert_eq!(portal.portal_type, PortalType::Unknown);
        assert!(!portal.manual);
        assert!(portal.cooks.is_none());
    }

    #[test]
    fn test_explicit_manual_is_kept() {
        let stored: StoredPortal = serde_json::from_str(
            r#"{"guid": "abc.16", "lat": 0, "lng": 0, "name": "Fountain", "manual": true}"#,
        )
        .unwrap();
        assert!(stored.normalize().manual);
    }
}
