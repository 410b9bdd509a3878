use super::error::SourceError;
use crate::geo::GeoPoint;
use crate::observations::Observation;
use async_trait::async_trait;

/// Cell tower registry queried by position and search radius.
#[async_trait]
pub trait CellTowerSource: Send + Sync {
    async fn towers_near(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<Observation>, SourceError>;
}

/// Wi-Fi access point source. The search radius is chosen by the source.
#[async_trait]
pub trait WifiSource: Send + Sync {
    async fn networks_near(&self, center: GeoPoint) -> Result<Vec<Observation>, SourceError>;
}

/// Bluetooth scanner bound to a named scan context rather than a position.
#[async_trait]
pub trait BluetoothSource: Send + Sync {
    async fn devices(&self, context_id: &str) -> Result<Vec<Observation>, SourceError>;
}

/// Airborne drone source. The engine registers two of these and unions
/// their results; a source is free to ignore the radius hint.
#[async_trait]
pub trait DroneSource: Send + Sync {
    async fn drones_near(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<Observation>, SourceError>;
}

/// Public webcam directory queried by position and search radius.
#[async_trait]
pub trait CameraSource: Send + Sync {
    async fn webcams_near(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<Observation>, SourceError>;
}
