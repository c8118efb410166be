//! Report hotspot grouping for the heat map.

use std::collections::HashMap;

use ripple_common::GeoPoint;
use serde::Serialize;

/// Lowest intensity any group is drawn with.
pub const MIN_INTENSITY: f64 = 0.2;

/// Reports sharing a location, rounded to five decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
    pub intensity: f64,
}

/// Group points by their 5-decimal key, in first-seen order.
///
/// Each group keeps the coordinates of its first point.
#[must_use]
pub fn group_hotspots(points: &[GeoPoint]) -> Vec<Hotspot> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Hotspot> = Vec::new();

    for point in points {
        let key = format!("{:.5},{:.5}", point.lat, point.lng);
        match index.get(&key) {
            Some(&i) => groups[i].count += 1,
            None => {
                index.insert(key, groups.len());
                groups.push(Hotspot {
                    lat: point.lat,
                    lng: point.lng,
                    count: 1,
                    intensity: 0.0,
                });
            }
        }
    }

    let max = groups.iter().map(|g| g.count).max().unwrap_or(1).max(1);
    for group in &mut groups {
        let ratio = group.count as f64 / max as f64;
        group.intensity = ratio.max(MIN_INTENSITY);
    }

    groups
}
