use thiserror::Error;

/// The primary error type for the geo-tracker crate.
///
/// None of these are fatal to the tracking loop itself; they surface from
/// the specific operation that failed while the loop keeps running.
#[derive(Error, Debug)]
pub enum GeoTrackerError {
    #[error("sensor source query failed: {0}")]
    Source(#[from] crate::sources::SourceError),

    #[error("location fix failed: {0}")]
    Location(#[from] crate::sources::LocationError),

    #[error("connection store operation failed: {0}")]
    Store(#[from] crate::sources::StoreError),

    #[error("command dispatch failed: {0}")]
    Command(#[from] crate::sources::CommandError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
