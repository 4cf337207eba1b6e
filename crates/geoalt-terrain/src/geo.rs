//! Geographic bounding boxes and the local planar projection.
//!
//! The projection is an equirectangular approximation centered on the
//! bounding box. It applies no ellipsoidal correction and is only meant for
//! extents of a few kilometres; larger areas will be visibly distorted.

use crate::{Result, TerrainError};
use serde::{Deserialize, Serialize};

/// Metres per degree of latitude (equatorial-degree approximation).
pub const EARTH_METERS_PER_DEGREE: f64 = 111120.0;

/// Rectangular WGS84 extent in decimal degrees.
///
/// No antimeridian or pole wraparound is handled: `north > south` and
/// `east > west` must hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// North edge latitude.
    pub north: f64,
    /// South edge latitude.
    pub south: f64,
    /// East edge longitude.
    pub east: f64,
    /// West edge longitude.
    pub west: f64,
}

/// Named areas that ship with the tool.
pub const PRESETS: &[(&str, BoundingBox)] = &[
    (
        "la-revellata",
        BoundingBox {
            north: 42.585322,
            south: 42.581024,
            east: 8.72734,
            west: 8.720999,
        },
    ),
    (
        "la-rhune",
        BoundingBox {
            north: 43.319527,
            south: 43.319,
            east: -1.652,
            west: -1.652756,
        },
    ),
    (
        "oloron",
        BoundingBox {
            north: 43.195645,
            south: 43.192090,
            east: -0.603585,
            west: -0.606585,
        },
    ),
];

impl BoundingBox {
    /// Create a validated bounding box.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        let bbox = Self {
            north,
            south,
            east,
            west,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Look up a named preset.
    pub fn preset(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, bbox)| *bbox)
    }

    /// Check the extent is positive on both axes.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| TerrainError::InvalidBoundingBox {
            north: self.north,
            south: self.south,
            east: self.east,
            west: self.west,
            reason: reason.to_string(),
        };

        if ![self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(invalid("corners must be finite"));
        }
        if !(-90.0..=90.0).contains(&self.north) || !(-90.0..=90.0).contains(&self.south) {
            return Err(invalid("latitudes must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.east) || !(-180.0..=180.0).contains(&self.west) {
            return Err(invalid("longitudes must be within [-180, 180]"));
        }
        if self.north <= self.south {
            return Err(invalid("north must be greater than south"));
        }
        if self.east <= self.west {
            return Err(invalid("east must be greater than west"));
        }
        Ok(())
    }

    /// Latitude of the box center.
    pub fn mid_lat(&self) -> f64 {
        (self.north + self.south) / 2.0
    }

    /// Longitude of the box center.
    pub fn mid_lon(&self) -> f64 {
        (self.east + self.west) / 2.0
    }

    /// Check if a coordinate is within the box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

/// Fixed reference used to convert lon/lat to local metres for one run.
///
/// All conversions of a run must go through the same frame so relative
/// positions stay consistent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionFrame {
    /// Latitude of the frame origin.
    pub mid_lat: f64,
    /// Longitude of the frame origin.
    pub mid_lon: f64,
    /// cos(mid_lat), shrinks longitude degrees with latitude.
    pub convergence: f64,
}

impl ProjectionFrame {
    /// Build the frame centered on a bounding box.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        let mid_lat = bbox.mid_lat();
        Self {
            mid_lat,
            mid_lon: bbox.mid_lon(),
            convergence: mid_lat.to_radians().cos(),
        }
    }

    /// Local X in metres (east positive).
    pub fn to_local_x(&self, lon: f64) -> f64 {
        (lon - self.mid_lon) * self.convergence * EARTH_METERS_PER_DEGREE
    }

    /// Local Y in metres (north positive).
    pub fn to_local_y(&self, lat: f64) -> f64 {
        (lat - self.mid_lat) * EARTH_METERS_PER_DEGREE
    }

    /// Local (x, y) for a geographic point.
    pub fn to_local(&self, lon: f64, lat: f64) -> (f64, f64) {
        (self.to_local_x(lon), self.to_local_y(lat))
    }

    /// Inverse of [`to_local_x`](Self::to_local_x).
    pub fn to_lon(&self, x: f64) -> f64 {
        x / (self.convergence * EARTH_METERS_PER_DEGREE) + self.mid_lon
    }

    /// Inverse of [`to_local_y`](Self::to_local_y).
    pub fn to_lat(&self, y: f64) -> f64 {
        y / EARTH_METERS_PER_DEGREE + self.mid_lat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn revellata() -> BoundingBox {
        BoundingBox::preset("la-revellata").unwrap()
    }

    #[test]
    fn test_invalid_boxes() {
        assert!(BoundingBox::new(42.0, 42.0, 9.0, 8.0).is_err());
        assert!(BoundingBox::new(41.0, 42.0, 9.0, 8.0).is_err());
        assert!(BoundingBox::new(42.0, 41.0, 8.0, 9.0).is_err());
        assert!(BoundingBox::new(f64::NAN, 41.0, 9.0, 8.0).is_err());
        assert!(BoundingBox::new(95.0, 41.0, 9.0, 8.0).is_err());
        assert!(BoundingBox::new(42.0, 41.0, 9.0, 8.0).is_ok());
    }

    #[test]
    fn test_presets() {
        for (name, bbox) in PRESETS {
            assert!(bbox.validate().is_ok(), "preset {} is invalid", name);
        }
        assert_eq!(BoundingBox::preset("LA-RHUNE").unwrap().west, -1.652756);
        assert!(BoundingBox::preset("atlantis").is_none());
    }

    #[test]
    fn test_frame_center_is_origin() {
        let bbox = revellata();
        let frame = ProjectionFrame::from_bbox(&bbox);
        assert_relative_eq!(frame.to_local_x(bbox.mid_lon()), 0.0);
        assert_relative_eq!(frame.to_local_y(bbox.mid_lat()), 0.0);
        assert_relative_eq!(frame.convergence, 42.583173f64.to_radians().cos(), epsilon = 1e-12);
    }

    #[test]
    fn test_axes_orientation() {
        let bbox = revellata();
        let frame = ProjectionFrame::from_bbox(&bbox);
        assert!(frame.to_local_x(bbox.east) > 0.0);
        assert!(frame.to_local_x(bbox.west) < 0.0);
        assert!(frame.to_local_y(bbox.north) > 0.0);
        assert!(frame.to_local_y(bbox.south) < 0.0);
        // One degree of latitude is the constant scale
        assert_relative_eq!(frame.to_local_y(frame.mid_lat + 1.0), EARTH_METERS_PER_DEGREE);
    }

    #[test]
    fn test_projection_is_pure() {
        let frame = ProjectionFrame::from_bbox(&revellata());
        let first = frame.to_local(8.723, 42.582);
        let second = frame.to_local(8.723, 42.582);
        assert_eq!(first, second);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let frame = ProjectionFrame::from_bbox(&revellata());
        let (x, y) = frame.to_local(8.7251, 42.5839);
        assert_relative_eq!(frame.to_lon(x), 8.7251, epsilon = 1e-12);
        assert_relative_eq!(frame.to_lat(y), 42.5839, epsilon = 1e-12);
    }
}
