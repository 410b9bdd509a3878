use crate::aggregator::{SensorAggregator, SensorRadii, SensorSources};
use crate::connections::{ConnectionLog, ConnectionRecord};
use crate::dispatch::{CommandDispatcher, FrequencyScanJob, OverlayState};
use crate::error::GeoTrackerError;
use crate::geo::GeoPoint;
use crate::observations::{Category, Observation};
use crate::proximity::{self, DistanceSummary};
use crate::sources::{
    BluetoothSource, CameraCommand, CameraControl, CameraSource, CellTowerSource, ConnectionStore,
    DiscoverySource, DroneSource, LocationProvider, SpectrumControl, WifiSource,
};
use crate::tracker::{LocationTracker, TrackPoint};
use bon::bon;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// The live tracking and correlation engine.
///
/// Owns the location tracker, the sensor aggregator, the connection log and
/// the command dispatcher, and drives them from a single periodic tick:
/// position fix, concurrent sensor fan-out, nearest-per-category recompute,
/// auto-discovery persistence. Construct it with the builder, then call
/// [`start`](Self::start); every accessor returns an owned snapshot and is
/// safe to call while the loop runs.
///
/// ```ignore
/// let tracker = GeoTracker::builder()
///     .location_provider(provider)
///     .cell_tower_source(towers)
///     .wifi_source(wifi)
///     .bluetooth_source(bluetooth)
///     .drone_sources(vec![radio_detector, registry])
///     .camera_source(webcams)
///     .discovery_source(discovery)
///     .connection_store(store)
///     .camera_control(ptz)
///     .spectrum_control(sdr)
///     .build();
/// tracker.start().await;
/// ```
pub struct GeoTracker {
    tracker: Arc<LocationTracker>,
    aggregator: Arc<SensorAggregator>,
    connections: Arc<ConnectionLog>,
    dispatcher: Arc<CommandDispatcher>,
    discovery: Arc<dyn DiscoverySource>,
    tick_interval: Duration,
    latest_summary: Arc<RwLock<DistanceSummary>>,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

#[bon]
impl GeoTracker {
    /// Builds the engine from its collaborators.
    ///
    /// # Builder Arguments
    ///
    /// * `tick_interval: Duration` - (Default: 2.5 s) Delay between tracking ticks.
    /// * `fix_timeout: Duration` - (Default: 2 s) Cap on each position request.
    /// * `path_capacity: usize` - (Default: 512) Ring-buffer bound on the path history.
    /// * `path_context_len: usize` - (Default: 10) Path points attached to each persisted connection.
    /// * `radii: SensorRadii` - Per-category search radii (cell towers 5 km, drones 10 km, cameras 50 m).
    /// * `bluetooth_context: String` - (Default: `"dashboard"`) Scan context id sent to the Bluetooth source.
    #[builder]
    pub fn new(
        location_provider: Arc<dyn LocationProvider>,
        cell_tower_source: Arc<dyn CellTowerSource>,
        wifi_source: Arc<dyn WifiSource>,
        bluetooth_source: Arc<dyn BluetoothSource>,
        drone_sources: Vec<Arc<dyn DroneSource>>,
        camera_source: Arc<dyn CameraSource>,
        discovery_source: Arc<dyn DiscoverySource>,
        connection_store: Arc<dyn ConnectionStore>,
        camera_control: Arc<dyn CameraControl>,
        spectrum_control: Arc<dyn SpectrumControl>,
        #[builder(default = Duration::from_millis(2500))] tick_interval: Duration,
        #[builder(default = Duration::from_secs(2))] fix_timeout: Duration,
        #[builder(default = 512)] path_capacity: usize,
        #[builder(default = 10)] path_context_len: usize,
        #[builder(default)] radii: SensorRadii,
        #[builder(default = "dashboard".to_string())] bluetooth_context: String,
    ) -> Self {
        let tracker = Arc::new(LocationTracker::new(
            location_provider,
            fix_timeout,
            path_capacity,
        ));
        let aggregator = Arc::new(SensorAggregator::new(
            SensorSources {
                cell_towers: cell_tower_source,
                wifi: wifi_source,
                bluetooth: bluetooth_source,
                drones: drone_sources,
                cameras: camera_source,
            },
            radii,
            bluetooth_context,
        ));
        let connections = Arc::new(ConnectionLog::new(connection_store, path_context_len));
        let dispatcher = Arc::new(CommandDispatcher::new(camera_control, spectrum_control));
        Self {
            tracker,
            aggregator,
            connections,
            dispatcher,
            discovery: discovery_source,
            tick_interval,
            latest_summary: Arc::new(RwLock::new(DistanceSummary::default())),
            loop_task: Mutex::new(None),
        }
    }

    /// Loads the saved connection history and starts the tick loop.
    /// A no-op when the loop is already running.
    pub async fn start(&self) {
        if self.loop_task.lock().expect("loop task lock poisoned").is_some() {
            return;
        }
        self.connections.load_all().await;

        let ctx = TickContext {
            tracker: Arc::clone(&self.tracker),
            aggregator: Arc::clone(&self.aggregator),
            connections: Arc::clone(&self.connections),
            dispatcher: Arc::clone(&self.dispatcher),
            discovery: Arc::clone(&self.discovery),
            latest_summary: Arc::clone(&self.latest_summary),
        };
        let tick_interval = self.tick_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                ctx.run_tick().await;
            }
        });

        let mut guard = self.loop_task.lock().expect("loop task lock poisoned");
        if guard.is_some() {
            handle.abort();
            return;
        }
        info!(interval_ms = self.tick_interval.as_millis() as u64, "live tracking started");
        *guard = Some(handle);
    }

    /// Cancels the tick loop, including any in-flight location request.
    /// Idempotent; the engine can be started again afterwards.
    pub fn stop(&self) {
        if let Some(handle) = self
            .loop_task
            .lock()
            .expect("loop task lock poisoned")
            .take()
        {
            handle.abort();
            info!("live tracking stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.loop_task
            .lock()
            .expect("loop task lock poisoned")
            .is_some()
    }

    /// Last known position, or `None` before the first successful fix.
    pub fn current_position(&self) -> Option<TrackPoint> {
        self.tracker.current_position()
    }

    /// The last `k` path points, oldest first.
    pub fn recent_path(&self, k: usize) -> Vec<TrackPoint> {
        self.tracker.recent_path(k)
    }

    /// Current observations for one category.
    pub fn observations(&self, category: Category) -> Vec<Observation> {
        self.aggregator.observations(category)
    }

    /// Owned copy of every category's observation set.
    pub fn observation_snapshot(&self) -> HashMap<Category, Vec<Observation>> {
        self.aggregator.snapshot()
    }

    /// Nearest observation per category, as of the last completed tick.
    pub fn distance_summary(&self) -> DistanceSummary {
        self.latest_summary
            .read()
            .expect("distance summary lock poisoned")
            .clone()
    }

    /// Persisted connection history, oldest first.
    pub fn saved_connections(&self) -> Vec<ConnectionRecord> {
        self.connections.saved()
    }

    pub fn overlays(&self) -> OverlayState {
        self.dispatcher.overlays()
    }

    /// Flips one category overlay and returns the new value.
    pub fn toggle_overlay(&self, category: Category) -> bool {
        self.dispatcher.toggle(category)
    }

    pub fn set_tracking(&self, enabled: bool) {
        self.dispatcher.set_tracking(enabled);
    }

    pub fn frequency_scan_job(&self) -> FrequencyScanJob {
        self.dispatcher.scan_job()
    }

    /// Forwards one PTZ/capture command to the camera controller.
    pub async fn send_camera_command(
        &self,
        camera_id: &str,
        command: CameraCommand,
    ) -> Result<String, GeoTrackerError> {
        Ok(self.dispatcher.send_camera_command(camera_id, command).await?)
    }

    /// Tunes the SDR collaborator to `frequency_mhz`.
    pub async fn tune_frequency(&self, frequency_mhz: u32) -> Result<String, GeoTrackerError> {
        Ok(self.dispatcher.tune_frequency(frequency_mhz).await?)
    }

    /// Sweeps the SDR collaborator over `[start_mhz, end_mhz]`.
    pub async fn scan_frequency_range(
        &self,
        start_mhz: u32,
        end_mhz: u32,
    ) -> Result<String, GeoTrackerError> {
        Ok(self
            .dispatcher
            .scan_frequency_range(start_mhz, end_mhz)
            .await?)
    }
}

impl Drop for GeoTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything one tick needs, cloned into the loop task.
struct TickContext {
    tracker: Arc<LocationTracker>,
    aggregator: Arc<SensorAggregator>,
    connections: Arc<ConnectionLog>,
    dispatcher: Arc<CommandDispatcher>,
    discovery: Arc<dyn DiscoverySource>,
    latest_summary: Arc<RwLock<DistanceSummary>>,
}

impl TickContext {
    /// One full tick: position fix, sensor fan-out, distance recompute,
    /// auto-discovery persistence. Runs to completion before the next tick
    /// fires; a slow tick skips intermediate interval fires rather than
    /// overlapping.
    async fn run_tick(&self) {
        let fresh = self.tracker.advance().await;
        // A failed fix falls back to the last known position so the sweep
        // still refreshes around it.
        let position = match fresh.or_else(|| self.tracker.current_position()) {
            Some(track_point) => track_point.point(),
            None => {
                debug!("no position fix yet, skipping sensor sweep");
                return;
            }
        };

        let overlays = self.dispatcher.overlays();
        self.aggregator.collect(position, &overlays).await;

        let summary = proximity::summarize(position, &self.aggregator.snapshot());
        *self
            .latest_summary
            .write()
            .expect("distance summary lock poisoned") = summary;

        self.scan_for_new_connections(position).await;
    }

    async fn scan_for_new_connections(&self, position: GeoPoint) {
        let discovered = match self.discovery.discover(position).await {
            Ok(list) => list,
            Err(error) => {
                warn!(%error, "auto-discovery scan failed");
                return;
            }
        };
        if discovered.is_empty() {
            return;
        }
        info!(count = discovered.len(), "auto-discovery reported new connections");
        for connection in discovered {
            let path_context = self.tracker.recent_path(self.connections.path_context_len());
            self.connections
                .record(connection, position, path_context)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::DiscoveredConnection;
    use crate::geo::GeoPoint;
    use crate::observations::ObservationDetail;
    use crate::sources::{FixRequest, LocationError, LocationFix, SourceError, StoreError};
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Walks a scripted route, then keeps reporting the final fix.
    struct RouteProvider {
        route: std::sync::Mutex<VecDeque<LocationFix>>,
        last: std::sync::Mutex<Option<LocationFix>>,
    }

    impl RouteProvider {
        fn new(route: Vec<(f64, f64)>) -> Arc<Self> {
            let route = route
                .into_iter()
                .map(|(lat, lon)| LocationFix {
                    lat,
                    lon,
                    accuracy_m: 5.0,
                })
                .collect();
            Arc::new(Self {
                route: std::sync::Mutex::new(route),
                last: std::sync::Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl LocationProvider for RouteProvider {
        async fn request_fix(&self, _request: FixRequest) -> Result<LocationFix, LocationError> {
            if let Some(fix) = self.route.lock().unwrap().pop_front() {
                *self.last.lock().unwrap() = Some(fix);
            }
            self.last
                .lock()
                .unwrap()
                .ok_or_else(|| LocationError::Unavailable("no fix yet".to_string()))
        }
    }

    /// Fixed observation set for every sensor trait.
    struct FixedSource {
        observations: Vec<Observation>,
    }

    impl FixedSource {
        fn new(observations: Vec<Observation>) -> Arc<Self> {
            Arc::new(Self { observations })
        }

        fn empty() -> Arc<Self> {
            Self::new(Vec::new())
        }
    }

    #[async_trait]
    impl CellTowerSource for FixedSource {
        async fn towers_near(
            &self,
            _center: GeoPoint,
            _radius_m: f64,
        ) -> Result<Vec<Observation>, SourceError> {
            Ok(self.observations.clone())
        }
    }

    #[async_trait]
    impl WifiSource for FixedSource {
        async fn networks_near(&self, _center: GeoPoint) -> Result<Vec<Observation>, SourceError> {
            Ok(self.observations.clone())
        }
    }

    #[async_trait]
    impl BluetoothSource for FixedSource {
        async fn devices(&self, _context_id: &str) -> Result<Vec<Observation>, SourceError> {
            Ok(self.observations.clone())
        }
    }

    #[async_trait]
    impl DroneSource for FixedSource {
        async fn drones_near(
            &self,
            _center: GeoPoint,
            _radius_m: f64,
        ) -> Result<Vec<Observation>, SourceError> {
            Ok(self.observations.clone())
        }
    }

    #[async_trait]
    impl CameraSource for FixedSource {
        async fn webcams_near(
            &self,
            _center: GeoPoint,
            _radius_m: f64,
        ) -> Result<Vec<Observation>, SourceError> {
            Ok(self.observations.clone())
        }
    }

    /// Reports each queued batch of discoveries once.
    struct QueuedDiscovery {
        batches: std::sync::Mutex<VecDeque<Vec<DiscoveredConnection>>>,
    }

    impl QueuedDiscovery {
        fn new(batches: Vec<Vec<DiscoveredConnection>>) -> Arc<Self> {
            Arc::new(Self {
                batches: std::sync::Mutex::new(batches.into()),
            })
        }

        fn silent() -> Arc<Self> {
            Self::new(Vec::new())
        }
    }

    #[async_trait]
    impl DiscoverySource for QueuedDiscovery {
        async fn discover(
            &self,
            _center: GeoPoint,
        ) -> Result<Vec<DiscoveredConnection>, SourceError> {
            Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    struct MemoryStore {
        records: std::sync::Mutex<Vec<ConnectionRecord>>,
    }

    impl MemoryStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                records: std::sync::Mutex::new(Vec::new()),
            })
        }
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

    struct NoopControls;

    #[async_trait]
    impl CameraControl for NoopControls {
        async fn send(
            &self,
            _camera_id: &str,
            _command: CameraCommand,
        ) -> Result<String, crate::sources::CommandError> {
            Ok("ok".to_string())
        }
    }

    #[async_trait]
    impl SpectrumControl for NoopControls {
        async fn tune(&self, _frequency_mhz: u32) -> Result<String, crate::sources::CommandError> {
            Ok("tuned".to_string())
        }

        async fn scan(
            &self,
            _start_mhz: u32,
            _end_mhz: u32,
        ) -> Result<String, crate::sources::CommandError> {
            Ok("done".to_string())
        }
    }

    fn lobby_camera() -> Observation {
        Observation::new(
            GeoPoint::new(40.0005, -74.0),
            ObservationDetail::Camera {
                id: "cam-1".to_string(),
                title: "lobby".to_string(),
                stream_url: None,
            },
        )
    }

    struct EngineFixture {
        engine: GeoTracker,
        store: Arc<MemoryStore>,
    }

    fn engine(
        route: Vec<(f64, f64)>,
        cameras: Vec<Observation>,
        discovery: Arc<QueuedDiscovery>,
    ) -> EngineFixture {
        let store = MemoryStore::new();
        let engine = GeoTracker::builder()
            .location_provider(RouteProvider::new(route))
            .cell_tower_source(FixedSource::empty())
            .wifi_source(FixedSource::empty())
            .bluetooth_source(FixedSource::empty())
            .drone_sources(vec![FixedSource::empty(), FixedSource::empty()])
            .camera_source(FixedSource::new(cameras))
            .discovery_source(discovery)
            .connection_store(store.clone())
            .camera_control(Arc::new(NoopControls))
            .spectrum_control(Arc::new(NoopControls))
            .tick_interval(Duration::from_millis(2500))
            .build();
        EngineFixture { engine, store }
    }

    #[tokio::test(start_paused = true)]
    async fn a_walk_north_brings_the_camera_within_56_meters() {
        let f = engine(
            vec![
                (40.0000, -74.0000),
                (40.0005, -74.0000),
                (40.0010, -74.0000),
            ],
            vec![lobby_camera()],
            QueuedDiscovery::silent(),
        );

        f.engine.start().await;
        // Ticks fire at 0 ms, 2500 ms and 5000 ms; stop before the fourth.
        tokio::time::sleep(Duration::from_millis(6000)).await;
        f.engine.stop();

        assert_eq!(f.engine.recent_path(10).len(), 3);
        let nearest = f.engine.distance_summary().camera.unwrap();
        assert_eq!(nearest.observation.display_name(), "lobby");
        assert!(
            (nearest.distance_m - 55.5).abs() < 1.0,
            "got {}",
            nearest.distance_m
        );
    }

    #[tokio::test(start_paused = true)]
    async fn discovered_connections_are_persisted_with_path_context() {
        let discovery = QueuedDiscovery::new(vec![
            Vec::new(),
            vec![DiscoveredConnection {
                kind: "wifi".to_string(),
                ssid: Some("cafe".to_string()),
                name: None,
                credentials: None,
                image: None,
                devices: None,
            }],
        ]);
        let f = engine(
            vec![(40.0, -74.0), (40.0001, -74.0), (40.0002, -74.0)],
            Vec::new(),
            discovery,
        );

        f.engine.start().await;
        tokio::time::sleep(Duration::from_millis(8000)).await;
        f.engine.stop();

        let saved = f.engine.saved_connections();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].ssid.as_deref(), Some("cafe"));
        // Reported on the second tick, so two path points exist by then.
        assert_eq!(saved[0].path_context.len(), 2);
        assert_eq!(saved[0].location.lat, 40.0001);
        assert_eq!(f.store.records.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_loads_previously_saved_connections() {
        let store = MemoryStore::new();
        store
            .records
            .lock()
            .unwrap()
            .push(ConnectionRecord {
                kind: "bluetooth".to_string(),
                ssid: None,
                name: Some("headset".to_string()),
                location: GeoPoint::new(40.0, -74.0),
                timestamp: chrono::Utc::now(),
                credentials: None,
                image: None,
                devices: None,
                path_context: Vec::new(),
            });

        let engine = GeoTracker::builder()
            .location_provider(RouteProvider::new(vec![(40.0, -74.0)]))
            .cell_tower_source(FixedSource::empty())
            .wifi_source(FixedSource::empty())
            .bluetooth_source(FixedSource::empty())
            .drone_sources(vec![FixedSource::empty()])
            .camera_source(FixedSource::empty())
            .discovery_source(QueuedDiscovery::silent())
            .connection_store(store)
            .camera_control(Arc::new(NoopControls))
            .spectrum_control(Arc::new(NoopControls))
            .build();

        engine.start().await;
        engine.stop();

        let saved = engine.saved_connections();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name.as_deref(), Some("headset"));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_the_tick_loop() {
        let f = engine(
            vec![(40.0, -74.0); 100],
            vec![lobby_camera()],
            QueuedDiscovery::silent(),
        );

        f.engine.start().await;
        tokio::time::sleep(Duration::from_millis(3000)).await;
        f.engine.stop();
        assert!(!f.engine.is_running());
        let path_after_stop = f.engine.recent_path(100).len();

        tokio::time::sleep(Duration::from_millis(10_000)).await;

        assert_eq!(f.engine.recent_path(100).len(), path_after_stop);
        // Stopping twice is fine.
        f.engine.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_camera_overlay_keeps_stale_observations_visible() {
        let f = engine(
            vec![(40.0, -74.0); 100],
            vec![lobby_camera()],
            QueuedDiscovery::silent(),
        );

        f.engine.start().await;
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(f.engine.observations(Category::Camera).len(), 1);

        f.engine.toggle_overlay(Category::Camera);
        tokio::time::sleep(Duration::from_millis(5000)).await;
        f.engine.stop();

        // Still holding the last fetched set.
        assert_eq!(f.engine.observations(Category::Camera).len(), 1);
    }
}
