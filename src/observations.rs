use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// One sensor type tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    CellTower,
    Wifi,
    Bluetooth,
    Drone,
    Camera,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::CellTower,
        Category::Wifi,
        Category::Bluetooth,
        Category::Drone,
        Category::Camera,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::CellTower => "cell tower",
            Category::Wifi => "wifi",
            Category::Bluetooth => "bluetooth",
            Category::Drone => "drone",
            Category::Camera => "camera",
        }
    }
}

/// A single reported reading from one sensor source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(flatten)]
    pub point: GeoPoint,
    #[serde(flatten)]
    pub detail: ObservationDetail,
}

/// Category-specific metrics carried by an observation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ObservationDetail {
    #[serde(rename_all = "camelCase")]
    CellTower {
        operator: String,
        signal_dbm: Option<f64>,
        coverage_radius_m: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Wifi {
        ssid: String,
        signal_dbm: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Bluetooth {
        name: String,
        rssi_dbm: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Drone {
        model: Option<String>,
        altitude_m: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Camera {
        id: String,
        title: String,
        stream_url: Option<String>,
    },
}

impl Observation {
    pub fn new(point: GeoPoint, detail: ObservationDetail) -> Self {
        Self { point, detail }
    }

    pub fn category(&self) -> Category {
        match self.detail {
            ObservationDetail::CellTower { .. } => Category::CellTower,
            ObservationDetail::Wifi { .. } => Category::Wifi,
            ObservationDetail::Bluetooth { .. } => Category::Bluetooth,
            ObservationDetail::Drone { .. } => Category::Drone,
            ObservationDetail::Camera { .. } => Category::Camera,
        }
    }

    /// Human-readable identity of the observed sensor, for logs and lists.
    pub fn display_name(&self) -> &str {
        match &self.detail {
            ObservationDetail::CellTower { operator, .. } => operator,
            ObservationDetail::Wifi { ssid, .. } => ssid,
            ObservationDetail::Bluetooth { name, .. } => name,
            ObservationDetail::Drone { model, .. } => model.as_deref().unwrap_or("unknown drone"),
            ObservationDetail::Camera { title, .. } => title,
        }
    }
}
