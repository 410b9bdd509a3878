use super::error::LocationError;
use crate::geo::GeoPoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options sent with every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixRequest {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    /// Maximum age of a cached fix the provider may return. Zero means a
    /// fresh fix is required.
    pub max_staleness_ms: u64,
}

impl Default for FixRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 2000,
            max_staleness_ms: 0,
        }
    }
}

/// A successful position fix.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: f64,
}

impl LocationFix {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Platform positioning service.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_fix(&self, request: FixRequest) -> Result<LocationFix, LocationError>;
}
