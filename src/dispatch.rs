//! Overlay toggles and outbound directive commands.
use crate::observations::Category;
use crate::sources::{CameraCommand, CameraControl, CommandError, SpectrumControl};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Band accepted by the SDR collaborator, in MHz.
pub const FREQUENCY_RANGE_MHZ: RangeInclusive<u32> = 24..=6000;

/// Which categories the aggregator refreshes and the renderer draws, plus
/// the path-drawing flag. Everything starts enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub cell_towers: bool,
    pub wifi: bool,
    pub bluetooth: bool,
    pub drones: bool,
    pub cameras: bool,
    pub tracking: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            cell_towers: true,
            wifi: true,
            bluetooth: true,
            drones: true,
            cameras: true,
            tracking: true,
        }
    }
}

impl OverlayState {
    pub fn enabled(&self, category: Category) -> bool {
        match category {
            Category::CellTower => self.cell_towers,
            Category::Wifi => self.wifi,
            Category::Bluetooth => self.bluetooth,
            Category::Drone => self.drones,
            Category::Camera => self.cameras,
        }
    }

    fn flag_mut(&mut self, category: Category) -> &mut bool {
        match category {
            Category::CellTower => &mut self.cell_towers,
            Category::Wifi => &mut self.wifi,
            Category::Bluetooth => &mut self.bluetooth,
            Category::Drone => &mut self.drones,
            Category::Camera => &mut self.cameras,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanMode {
    Scan,
    Tune,
    Monitor,
}

/// Transient state of the in-flight spectrum directive. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyScanJob {
    pub active: bool,
    pub frequency_mhz: u32,
    pub mode: ScanMode,
}

impl Default for FrequencyScanJob {
    fn default() -> Self {
        Self {
            active: false,
            frequency_mhz: 2412,
            mode: ScanMode::Scan,
        }
    }
}

/// Owns the overlay flags and forwards directive commands to the camera
/// and SDR collaborators. Command failures surface to the caller of that
/// command only; nothing is retried here.
pub struct CommandDispatcher {
    camera_control: Arc<dyn CameraControl>,
    spectrum: Arc<dyn SpectrumControl>,
    overlays: RwLock<OverlayState>,
    scan_job: RwLock<FrequencyScanJob>,
}

impl CommandDispatcher {
    pub fn new(camera_control: Arc<dyn CameraControl>, spectrum: Arc<dyn SpectrumControl>) -> Self {
        Self {
            camera_control,
            spectrum,
            overlays: RwLock::new(OverlayState::default()),
            scan_job: RwLock::new(FrequencyScanJob::default()),
        }
    }

    pub fn overlays(&self) -> OverlayState {
        *self.overlays.read().expect("overlay state lock poisoned")
    }

    /// Flips one category flag and returns the new value. Disabling stops
    /// refreshing and drawing; it never clears already-held observations.
    pub fn toggle(&self, category: Category) -> bool {
        let mut overlays = self.overlays.write().expect("overlay state lock poisoned");
        let flag = overlays.flag_mut(category);
        *flag = !*flag;
        let enabled = *flag;
        info!(category = category.label(), enabled, "overlay toggled");
        enabled
    }

    pub fn set_tracking(&self, enabled: bool) {
        self.overlays
            .write()
            .expect("overlay state lock poisoned")
            .tracking = enabled;
    }

    pub fn scan_job(&self) -> FrequencyScanJob {
        *self.scan_job.read().expect("scan job lock poisoned")
    }

    /// Forwards one PTZ/capture command to the camera controller.
    pub async fn send_camera_command(
        &self,
        camera_id: &str,
        command: CameraCommand,
    ) -> Result<String, CommandError> {
        if camera_id.trim().is_empty() {
            return Err(CommandError::InvalidParameter(
                "camera id must not be empty".to_string(),
            ));
        }
        self.camera_control.send(camera_id, command).await
    }

    /// Records the requested frequency on the scan job and forwards the
    /// tune directive.
    pub async fn tune_frequency(&self, frequency_mhz: u32) -> Result<String, CommandError> {
        check_frequency(frequency_mhz)?;
        {
            let mut job = self.scan_job.write().expect("scan job lock poisoned");
            job.frequency_mhz = frequency_mhz;
            job.mode = ScanMode::Tune;
        }
        self.spectrum.tune(frequency_mhz).await
    }

    /// Runs a sweep over `[start_mhz, end_mhz]`. The job is marked active
    /// for the duration and reset once the collaborator settles, whether
    /// or not the sweep succeeded.
    pub async fn scan_frequency_range(
        &self,
        start_mhz: u32,
        end_mhz: u32,
    ) -> Result<String, CommandError> {
        if start_mhz >= end_mhz {
            return Err(CommandError::InvalidParameter(format!(
                "scan range start {start_mhz} MHz must be below end {end_mhz} MHz"
            )));
        }
        check_frequency(start_mhz)?;
        check_frequency(end_mhz)?;

        {
            let mut job = self.scan_job.write().expect("scan job lock poisoned");
            job.active = true;
            job.mode = ScanMode::Scan;
        }
        let result = self.spectrum.scan(start_mhz, end_mhz).await;
        self.scan_job
            .write()
            .expect("scan job lock poisoned")
            .active = false;
        result
    }
}

fn check_frequency(frequency_mhz: u32) -> Result<(), CommandError> {
    if FREQUENCY_RANGE_MHZ.contains(&frequency_mhz) {
        Ok(())
    } else {
        Err(CommandError::InvalidParameter(format!(
            "frequency {frequency_mhz} MHz outside supported band {}..={} MHz",
            FREQUENCY_RANGE_MHZ.start(),
            FREQUENCY_RANGE_MHZ.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingControls {
        camera_calls: AtomicUsize,
        spectrum_calls: AtomicUsize,
        fail: bool,
    }

    impl RecordingControls {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                camera_calls: AtomicUsize::new(0),
                spectrum_calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn answer(&self, ack: &str) -> Result<String, CommandError> {
            if self.fail {
                Err(CommandError::Dispatch("collaborator unreachable".to_string()))
            } else {
                Ok(ack.to_string())
            }
        }
    }

    #[async_trait]
    impl CameraControl for RecordingControls {
        async fn send(
            &self,
            _camera_id: &str,
            _command: CameraCommand,
        ) -> Result<String, CommandError> {
            self.camera_calls.fetch_add(1, Ordering::SeqCst);
            self.answer("ok")
        }
    }

    #[async_trait]
    impl SpectrumControl for RecordingControls {
        async fn tune(&self, _frequency_mhz: u32) -> Result<String, CommandError> {
            self.spectrum_calls.fetch_add(1, Ordering::SeqCst);
            self.answer("tuned")
        }

        async fn scan(&self, _start_mhz: u32, _end_mhz: u32) -> Result<String, CommandError> {
            self.spectrum_calls.fetch_add(1, Ordering::SeqCst);
            self.answer("scan complete")
        }
    }

    fn dispatcher(fail: bool) -> (Arc<RecordingControls>, CommandDispatcher) {
        let controls = RecordingControls::new(fail);
        let dispatcher = CommandDispatcher::new(controls.clone(), controls.clone());
        (controls, dispatcher)
    }

    #[test]
    fn overlays_start_fully_enabled() {
        let (_, dispatcher) = dispatcher(false);
        let overlays = dispatcher.overlays();
        assert!(Category::ALL.iter().all(|c| overlays.enabled(*c)));
        assert!(overlays.tracking);
    }

    #[test]
    fn toggle_flips_exactly_one_flag() {
        let (_, dispatcher) = dispatcher(false);

        assert!(!dispatcher.toggle(Category::Wifi));
        let overlays = dispatcher.overlays();
        assert!(!overlays.wifi);
        assert!(overlays.cell_towers && overlays.drones && overlays.cameras);

        assert!(dispatcher.toggle(Category::Wifi));
        assert!(dispatcher.overlays().wifi);
    }

    #[tokio::test]
    async fn empty_camera_id_is_rejected_before_dispatch() {
        let (controls, dispatcher) = dispatcher(false);

        let result = dispatcher.send_camera_command("  ", CameraCommand::Snapshot).await;

        assert!(matches!(result, Err(CommandError::InvalidParameter(_))));
        assert_eq!(controls.camera_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn camera_command_surfaces_the_collaborator_ack() {
        let (controls, dispatcher) = dispatcher(false);

        let ack = dispatcher
            .send_camera_command("cam-7", CameraCommand::ZoomIn)
            .await
            .unwrap();

        assert_eq!(ack, "ok");
        assert_eq!(controls.camera_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tune_records_the_frequency_on_the_job() {
        let (_, dispatcher) = dispatcher(false);

        dispatcher.tune_frequency(433).await.unwrap();

        let job = dispatcher.scan_job();
        assert_eq!(job.frequency_mhz, 433);
        assert_eq!(job.mode, ScanMode::Tune);
        assert!(!job.active);
    }

    #[tokio::test]
    async fn out_of_band_frequency_is_rejected_without_dispatch() {
        let (controls, dispatcher) = dispatcher(false);

        assert!(dispatcher.tune_frequency(7000).await.is_err());
        assert!(dispatcher.tune_frequency(23).await.is_err());
        assert_eq!(controls.spectrum_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scan_resets_active_after_success() {
        let (_, dispatcher) = dispatcher(false);

        let ack = dispatcher.scan_frequency_range(2400, 2500).await.unwrap();

        assert_eq!(ack, "scan complete");
        assert!(!dispatcher.scan_job().active);
        assert_eq!(dispatcher.scan_job().mode, ScanMode::Scan);
    }

    #[tokio::test]
    async fn scan_resets_active_after_failure_too() {
        let (_, dispatcher) = dispatcher(true);

        let result = dispatcher.scan_frequency_range(2400, 2500).await;

        assert!(result.is_err());
        assert!(!dispatcher.scan_job().active);
    }

    #[tokio::test]
    async fn inverted_scan_range_is_rejected_and_leaves_the_job_idle() {
        let (controls, dispatcher) = dispatcher(false);

        let result = dispatcher.scan_frequency_range(2500, 2400).await;

        assert!(matches!(result, Err(CommandError::InvalidParameter(_))));
        assert!(!dispatcher.scan_job().active);
        assert_eq!(controls.spectrum_calls.load(Ordering::SeqCst), 0);
    }
}
