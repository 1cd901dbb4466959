// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Geographic bounding box of the current map view.

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

/// A view box given by its north-east and south-west corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBounds {
    pub ne_lat: f64,
    pub ne_lng: f64,
    pub sw_lat: f64,
    pub sw_lng: f64,
}

impl ViewBounds {
    /// Build from any two opposite corners.
    pub fn from_rect(rect: Rect<f64>) -> Self {
        let min = rect.min();
        let max = rect.max();
        Self {
            ne_lat: max.y,
            ne_lng: max.x,
            sw_lat: min.y,
            sw_lng: min.x,
        }
    }

    /// Box as a `geo` rectangle (x = lng, y = lat). Corners are normalized.
    pub fn to_rect(self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.sw_lng, y: self.sw_lat },
            coord! { x: self.ne_lng, y: self.ne_lat },
        )
    }

    /// Reject boxes that are outside valid coordinate ranges.
    pub fn validate(&self) -> Result<(), String> {
        let lats = [self.ne_lat, self.sw_lat];
        let lngs = [self.ne_lng, self.sw_lng];

        if lats.iter().any(|v| !v.is_finite() || v.abs() > 90.0) {
            return Err("Latitude must be between -90 and 90".to_string());
        }
        if lngs.iter().any(|v| !v.is_finite() || v.abs() > 180.0) {
            return Err("Longitude must be between -180 and 180".to_string());
        }
        Ok(())
    }

    /// Query parameters in the remote directory's naming.
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("nelat", self.ne_lat.to_string()),
            ("nelng", self.ne_lng.to_string()),
            ("swlat", self.sw_lat.to_string()),
            ("swlng", self.sw_lng.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_corners() {
        let bounds = ViewBounds {
            ne_lat: 37.0,
            ne_lng: -122.0,
            sw_lat: 38.0,
            sw_lng: -121.0,
        };
        let normalized = ViewBounds::from_rect(bounds.to_rect());

        assert_eq!(normalized.ne_lat, 38.0);
        assert_eq!(normalized.sw_lat, 37.0);
        assert_eq!(normalized.ne_lng, -121.0);
        assert_eq!(normalized.sw_lng, -122.0);
    }

    #[test]
    fn test_validate_rejects_bad_latitude() {
        let bounds = ViewBounds {
            ne_lat: 91.0,
            ne_lng: 0.0,
            sw_lat: 0.0,
            sw_lng: 0.0,
        };
        assert!(bounds.validate().is_err());
    }
}
