//! # Geo Tracker
//!
//! Live geospatial tracking and multi-source sensor correlation.
//!
//! This crate drives a periodic tracking loop around a moving observer:
//! each tick it requests a fresh position fix, fans out concurrent queries
//! to the enabled sensor sources (cell towers, Wi-Fi, Bluetooth, drones,
//! public cameras), recomputes the nearest observation per category, and
//! persists newly discovered connections together with recent path context.
//!
//! ## Key Features
//!
//! - **Location tracking**: a cancellable 2.5 s tick with per-request
//!   timeouts and a bounded path history.
//! - **Isolated fan-out**: sensor queries run concurrently and fail
//!   independently; a failed source keeps its previous observations.
//! - **Proximity**: pure Haversine nearest-per-category computation.
//! - **Connection persistence**: discovered encounters are stamped with
//!   position, time and the last path points, then stored exactly once.
//! - **Command dispatch**: overlay toggles, camera PTZ and SDR tune/scan
//!   directives forwarded to their collaborators.
//!
//! ## Usage
//!
//! Wire the engine to implementations of the collaborator traits in
//! [`sources`], then start the loop:
//!
//! ```ignore
//! use geo_tracker::GeoTracker;
//!
//! let tracker = GeoTracker::builder()
//!     .location_provider(gps)
//!     .cell_tower_source(open_cell_id)
//!     .wifi_source(wifi_scanner)
//!     .bluetooth_source(bluetooth_scanner)
//!     .drone_sources(vec![rf_detector, drone_registry])
//!     .camera_source(webcam_directory)
//!     .discovery_source(auto_discovery)
//!     .connection_store(store)
//!     .camera_control(ptz)
//!     .spectrum_control(sdr)
//!     .build();
//!
//! tracker.start().await;
//! let nearest = tracker.distance_summary();
//! ```

pub mod aggregator;
pub mod connections;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod geo_tracker;
pub mod observations;
pub mod proximity;
pub mod sources;
pub mod tracker;

pub use error::GeoTrackerError;
pub use geo_tracker::GeoTracker;
