use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, shared by all great-circle math.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate pair. Plain value type, copied freely.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self, other)
    }
}

/// Haversine distance between two points in meters.
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi_a = a.lat.to_radians();
    let phi_b = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Formats a distance for display: meters below one kilometer, kilometers
/// with two decimals from there on.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0}m")
    } else {
        format!("{:.2}km", meters / 1000.0)
    }
}
