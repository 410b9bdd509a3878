//! Collaborator contracts the tracking engine consumes. Every network-facing
//! dependency (positioning, sensor sources, persistence, outbound commands)
//! sits behind one of these traits.
mod control;
mod error;
mod location;
mod sensors;
mod store;

pub use control::{CameraCommand, CameraControl, SpectrumControl};
pub use error::{CommandError, LocationError, SourceError, StoreError};
pub use location::{FixRequest, LocationFix, LocationProvider};
pub use sensors::{BluetoothSource, CameraSource, CellTowerSource, DroneSource, WifiSource};
pub use store::{ConnectionStore, DiscoverySource};
