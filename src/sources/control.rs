use super::error::CommandError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// PTZ and capture directives understood by the camera controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraCommand {
    Up,
    Down,
    Left,
    Right,
    ZoomIn,
    ZoomOut,
    Snapshot,
    Record,
}

/// Remote camera controller.
#[async_trait]
pub trait CameraControl: Send + Sync {
    async fn send(&self, camera_id: &str, command: CameraCommand) -> Result<String, CommandError>;
}

/// SDR frontend accepting tune and sweep directives.
#[async_trait]
pub trait SpectrumControl: Send + Sync {
    async fn tune(&self, frequency_mhz: u32) -> Result<String, CommandError>;

    async fn scan(&self, start_mhz: u32, end_mhz: u32) -> Result<String, CommandError>;
}
