//! Coordinate parsing and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for distance filtering, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Distance to another point in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Parse a stored coordinate value.
///
/// Accepts `"lat,lng"` first and a `{"lat": .., "lng": ..}` JSON object
/// second. Anything else yields `None`.
#[must_use]
pub fn parse_coords(raw: &str) -> Option<GeoPoint> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some((lat, lng)) = raw.split_once(',') {
        // Only the first two comma-separated parts are considered.
        let lng = lng.split(',').next().unwrap_or(lng);
        if let (Ok(lat), Ok(lng)) = (lat.trim().parse::<f64>(), lng.trim().parse::<f64>())
            && lat.is_finite()
            && lng.is_finite()
        {
            return Some(GeoPoint { lat, lng });
        }
    }

    serde_json::from_str::<GeoPoint>(raw)
        .ok()
        .filter(|p| p.lat.is_finite() && p.lng.is_finite())
}

/// Haversine distance between two coordinates, in kilometres.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}
