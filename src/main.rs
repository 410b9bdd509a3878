use async_trait::async_trait;
use geo_tracker::GeoTracker;
use geo_tracker::connections::{ConnectionRecord, DiscoveredConnection};
use geo_tracker::geo::{GeoPoint, format_distance};
use geo_tracker::observations::{Category, Observation, ObservationDetail};
use geo_tracker::sources::{
    BluetoothSource, CameraCommand, CameraControl, CameraSource, CellTowerSource, CommandError,
    ConnectionStore, DiscoverySource, DroneSource, FixRequest, LocationError, LocationFix,
    LocationProvider, SourceError, SpectrumControl, StoreError, WifiSource,
};
use rand::RngExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Walks north from a start point, with a little GPS jitter per fix.
struct SimulatedGps {
    start: GeoPoint,
    ticks: Mutex<u32>,
}

#[async_trait]
impl LocationProvider for SimulatedGps {
    async fn request_fix(&self, _request: FixRequest) -> Result<LocationFix, LocationError> {
        let mut ticks = self.ticks.lock().unwrap();
        let step = *ticks;
        *ticks += 1;
        let mut rng = rand::rng();
        Ok(LocationFix {
            lat: self.start.lat + f64::from(step) * 0.0005 + rng.random_range(-1e-5..1e-5),
            lon: self.start.lon + rng.random_range(-1e-5..1e-5),
            accuracy_m: rng.random_range(3.0..12.0),
        })
    }
}

/// Serves a fixed observation set for whichever sensor trait it is wired to.
struct FixedObservations {
    observations: Vec<Observation>,
}

impl FixedObservations {
    fn new(observations: Vec<Observation>) -> Arc<Self> {
        Arc::new(Self { observations })
    }
}

#[async_trait]
impl CellTowerSource for FixedObservations {
    async fn towers_near(
        &self,
        _center: GeoPoint,
        _radius_m: f64,
    ) -> Result<Vec<Observation>, SourceError> {
        Ok(self.observations.clone())
    }
}

#[async_trait]
impl WifiSource for FixedObservations {
    async fn networks_near(&self, _center: GeoPoint) -> Result<Vec<Observation>, SourceError> {
        Ok(self.observations.clone())
    }
}

#[async_trait]
impl BluetoothSource for FixedObservations {
    async fn devices(&self, _context_id: &str) -> Result<Vec<Observation>, SourceError> {
        Ok(self.observations.clone())
    }
}

#[async_trait]
impl DroneSource for FixedObservations {
    async fn drones_near(
        &self,
        _center: GeoPoint,
        _radius_m: f64,
    ) -> Result<Vec<Observation>, SourceError> {
        Ok(self.observations.clone())
    }
}

#[async_trait]
impl CameraSource for FixedObservations {
    async fn webcams_near(
        &self,
        _center: GeoPoint,
        _radius_m: f64,
    ) -> Result<Vec<Observation>, SourceError> {
        Ok(self.observations.clone())
    }
}

/// Reports one Wi-Fi encounter on its third call.
struct DemoDiscovery {
    calls: Mutex<u32>,
}

#[async_trait]
impl DiscoverySource for DemoDiscovery {
    async fn discover(&self, center: GeoPoint) -> Result<Vec<DiscoveredConnection>, SourceError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls != 3 {
            return Ok(Vec::new());
        }
        info!(lat = center.lat, lon = center.lon, "demo discovery fired");
        Ok(vec![DiscoveredConnection {
            kind: "wifi".to_string(),
            ssid: Some("corner-cafe".to_string()),
            name: None,
            credentials: None,
            image: None,
            devices: Some(vec!["phone".to_string(), "laptop".to_string()]),
        }])
    }
}

struct MemoryStore {
    records: Mutex<Vec<ConnectionRecord>>,
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn save(&self, record: ConnectionRecord) -> Result<ConnectionRecord, StoreError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn load_all(&self) -> Result<Vec<ConnectionRecord>, StoreError> {
        Ok(self.records.lock().unwrap().clone())
    }
}

struct EchoControls;

#[async_trait]
impl CameraControl for EchoControls {
    async fn send(&self, camera_id: &str, command: CameraCommand) -> Result<String, CommandError> {
        Ok(format!("camera {camera_id} acknowledged {command:?}"))
    }
}

#[async_trait]
impl SpectrumControl for EchoControls {
    async fn tune(&self, frequency_mhz: u32) -> Result<String, CommandError> {
        Ok(format!("tuned to {frequency_mhz} MHz"))
    }

    async fn scan(&self, start_mhz: u32, end_mhz: u32) -> Result<String, CommandError> {
        Ok(format!("swept {start_mhz}-{end_mhz} MHz"))
    }
}

#[tokio::main]
async fn main() -> Result<(), geo_tracker::GeoTrackerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geo_tracker=debug".into()),
        )
        .init();

    let start = GeoPoint::new(40.0000, -74.0000);

    let tracker = GeoTracker::builder()
        .location_provider(Arc::new(SimulatedGps {
            start,
            ticks: Mutex::new(0),
        }))
        .cell_tower_source(FixedObservations::new(vec![Observation::new(
            GeoPoint::new(40.0100, -74.0050),
            ObservationDetail::CellTower {
                operator: "demo-carrier".to_string(),
                signal_dbm: Some(-71.0),
                coverage_radius_m: Some(1800.0),
            },
        )]))
        .wifi_source(FixedObservations::new(vec![Observation::new(
            GeoPoint::new(40.0003, -74.0001),
            ObservationDetail::Wifi {
                ssid: "corner-cafe".to_string(),
                signal_dbm: Some(-44.0),
            },
        )]))
        .bluetooth_source(FixedObservations::new(Vec::new()))
        .drone_sources(vec![
            FixedObservations::new(vec![Observation::new(
                GeoPoint::new(40.0050, -74.0020),
                ObservationDetail::Drone {
                    model: Some("quadcopter".to_string()),
                    altitude_m: Some(90.0),
                },
            )]),
            FixedObservations::new(Vec::new()),
        ])
        .camera_source(FixedObservations::new(vec![Observation::new(
            GeoPoint::new(40.0005, -74.0000),
            ObservationDetail::Camera {
                id: "cam-lobby".to_string(),
                title: "lobby".to_string(),
                stream_url: None,
            },
        )]))
        .discovery_source(Arc::new(DemoDiscovery {
            calls: Mutex::new(0),
        }))
        .connection_store(Arc::new(MemoryStore {
            records: Mutex::new(Vec::new()),
        }))
        .camera_control(Arc::new(EchoControls))
        .spectrum_control(Arc::new(EchoControls))
        .build();

    tracker.start().await;

    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        if let Some(position) = tracker.current_position() {
            println!("observer at {:.6}, {:.6}", position.lat, position.lon);
        }
        let summary = tracker.distance_summary();
        for category in Category::ALL {
            if let Some(nearest) = summary.get(category) {
                println!(
                    "  nearest {}: {} at {}",
                    category.label(),
                    nearest.observation.display_name(),
                    format_distance(nearest.distance_m)
                );
            }
        }
    }

    let ack = tracker
        .send_camera_command("cam-lobby", CameraCommand::Snapshot)
        .await?;
    println!("{ack}");
    let report = tracker.scan_frequency_range(2400, 2500).await?;
    println!("{report}");

    for connection in tracker.saved_connections() {
        println!(
            "saved connection: {} ({}) with {} path points",
            connection.ssid.as_deref().unwrap_or("unnamed"),
            connection.kind,
            connection.path_context.len()
        );
    }

    tracker.stop();
    Ok(())
}
