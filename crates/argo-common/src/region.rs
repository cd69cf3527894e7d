//! Indian Ocean region classification.
//!
//! Profiles report a single surface position; the pipeline tags each with
//! the named regions whose bounding boxes contain it, an ocean basin, and a
//! one-degree grid reference.

use serde::Serialize;

/// A named region with a geographic bounding box (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionBounds {
    pub name: &'static str,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RegionBounds {
    /// Check if a point is contained within this region.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Center point of the region, used when a representative location is
    /// needed for an aggregate.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

/// Regional seas of the Indian Ocean basin. Boxes overlap; classification
/// returns every match.
pub const REGIONS: &[RegionBounds] = &[
    RegionBounds {
        name: "Arabian_Sea",
        min_lat: 8.0,
        max_lat: 30.0,
        min_lon: 50.0,
        max_lon: 80.0,
    },
    RegionBounds {
        name: "Bay_of_Bengal",
        min_lat: 5.0,
        max_lat: 25.0,
        min_lon: 80.0,
        max_lon: 100.0,
    },
    RegionBounds {
        name: "Equatorial_Indian",
        min_lat: -10.0,
        max_lat: 10.0,
        min_lon: 40.0,
        max_lon: 110.0,
    },
    RegionBounds {
        name: "Southern_Ocean",
        min_lat: -70.0,
        max_lat: -40.0,
        min_lon: 0.0,
        max_lon: 360.0,
    },
    RegionBounds {
        name: "Tropical_Indian",
        min_lat: -23.5,
        max_lat: 23.5,
        min_lon: 40.0,
        max_lon: 120.0,
    },
    RegionBounds {
        name: "Monsoon_Region",
        min_lat: 0.0,
        max_lat: 30.0,
        min_lon: 50.0,
        max_lon: 100.0,
    },
];

/// Names of every region containing the given point.
pub fn classify(lat: f64, lon: f64) -> Vec<&'static str> {
    REGIONS
        .iter()
        .filter(|r| r.contains(lat, lon))
        .map(|r| r.name)
        .collect()
}

/// Look up a region's bounds by name.
pub fn region(name: &str) -> Option<&'static RegionBounds> {
    REGIONS.iter().find(|r| r.name == name)
}

/// Coarse ocean-basin classification by longitude.
pub fn ocean_basin(lon: f64) -> &'static str {
    if lon < 20.0 {
        "Atlantic"
    } else if lon > 147.0 {
        "Pacific"
    } else {
        "Indian"
    }
}

/// Latitude band label.
pub fn geographic_zone(lat: f64) -> &'static str {
    if lat.abs() < 23.5 {
        "Tropical"
    } else if lat.abs() < 40.0 {
        "Subtropical"
    } else {
        "Temperate"
    }
}

/// One-degree grid reference, e.g. `N15E072`.
pub fn grid_1deg(lat: f64, lon: f64) -> String {
    let lat_dir = if lat < 0.0 { 'S' } else { 'N' };
    let lon_dir = if lon < 0.0 { 'W' } else { 'E' };
    format!(
        "{}{:02}{}{:03}",
        lat_dir,
        lat.trunc().abs() as u32,
        lon_dir,
        lon.trunc().abs() as u32
    )
}
