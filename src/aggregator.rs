//! Per-tick concurrent fan-out to the sensor sources.
use crate::dispatch::OverlayState;
use crate::geo::GeoPoint;
use crate::observations::{Category, Observation};
use crate::sources::{
    BluetoothSource, CameraSource, CellTowerSource, DroneSource, SourceError, WifiSource,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Search radius per category, in meters. Wi-Fi and Bluetooth radii are
/// decided by their sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRadii {
    pub cell_tower_m: f64,
    pub drone_m: f64,
    pub camera_m: f64,
}

impl Default for SensorRadii {
    fn default() -> Self {
        Self {
            cell_tower_m: 5000.0,
            drone_m: 10_000.0,
            camera_m: 50.0,
        }
    }
}

/// The sensor collaborators the aggregator fans out to. Drone results come
/// from every registered drone source, unioned.
pub struct SensorSources {
    pub cell_towers: Arc<dyn CellTowerSource>,
    pub wifi: Arc<dyn WifiSource>,
    pub bluetooth: Arc<dyn BluetoothSource>,
    pub drones: Vec<Arc<dyn DroneSource>>,
    pub cameras: Arc<dyn CameraSource>,
}

/// Queries the enabled sensor sources once per tick and owns the
/// per-category observation sets.
///
/// Queries within a tick run concurrently and fail independently: a failed
/// or disabled category keeps whatever observations its last successful
/// fetch produced, while the others are replaced wholesale.
pub struct SensorAggregator {
    sources: SensorSources,
    radii: SensorRadii,
    bluetooth_context: String,
    sets: RwLock<HashMap<Category, Vec<Observation>>>,
}

impl SensorAggregator {
    pub fn new(sources: SensorSources, radii: SensorRadii, bluetooth_context: String) -> Self {
        Self {
            sources,
            radii,
            bluetooth_context,
            sets: RwLock::new(HashMap::new()),
        }
    }

    /// Runs one fan-out from `position` and applies the results.
    ///
    /// Returns once every query of this tick has settled, so callers can
    /// recompute distances against a consistent snapshot afterwards.
    pub async fn collect(&self, position: GeoPoint, overlays: &OverlayState) {
        let (towers, networks, devices, drones, webcams) = tokio::join!(
            fetch(
                overlays.cell_towers,
                "cell tower source",
                self.sources
                    .cell_towers
                    .towers_near(position, self.radii.cell_tower_m),
            ),
            fetch(
                overlays.wifi,
                "wifi source",
                self.sources.wifi.networks_near(position),
            ),
            fetch(
                overlays.bluetooth,
                "bluetooth source",
                self.sources.bluetooth.devices(&self.bluetooth_context),
            ),
            self.fetch_drones(overlays.drones, position),
            fetch(
                overlays.cameras,
                "camera source",
                self.sources
                    .cameras
                    .webcams_near(position, self.radii.camera_m),
            ),
        );

        let mut sets = self.sets.write().expect("observation sets lock poisoned");
        for (category, result) in [
            (Category::CellTower, towers),
            (Category::Wifi, networks),
            (Category::Bluetooth, devices),
            (Category::Drone, drones),
            (Category::Camera, webcams),
        ] {
            if let Some(observations) = result {
                sets.insert(category, observations);
            }
        }
    }

    /// Queries every registered drone source and unions the results,
    /// duplicates included. The union replaces the drone set as long as at
    /// least one source answered; if all fail the previous set is kept.
    async fn fetch_drones(&self, enabled: bool, position: GeoPoint) -> Option<Vec<Observation>> {
        if !enabled {
            return None;
        }
        let mut union = Vec::new();
        let mut any_succeeded = false;
        for (index, source) in self.sources.drones.iter().enumerate() {
            match source.drones_near(position, self.radii.drone_m).await {
                Ok(mut drones) => {
                    any_succeeded = true;
                    union.append(&mut drones);
                }
                Err(error) => {
                    warn!(index, %error, "drone source query failed");
                }
            }
        }
        any_succeeded.then_some(union)
    }

    /// Current observations for one category. Empty if none were ever
    /// fetched.
    pub fn observations(&self, category: Category) -> Vec<Observation> {
        self.sets
            .read()
            .expect("observation sets lock poisoned")
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    /// Owned copy of every category's current observation set.
    pub fn snapshot(&self) -> HashMap<Category, Vec<Observation>> {
        self.sets
            .read()
            .expect("observation sets lock poisoned")
            .clone()
    }
}

/// Awaits one category query, turning a disabled overlay or a failed fetch
/// into "keep the previous set".
async fn fetch<F>(enabled: bool, endpoint: &str, query: F) -> Option<Vec<Observation>>
where
    F: Future<Output = Result<Vec<Observation>, SourceError>>,
{
    if !enabled {
        return None;
    }
    match query.await {
        Ok(observations) => Some(observations),
        Err(error) => {
            warn!(endpoint, %error, "sensor query failed, keeping previous observations");
            None
        }
    }
}
