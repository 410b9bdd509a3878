use thiserror::Error;

/// A single sensor-source query failing. Transient: the engine logs it,
/// keeps that category's previous observations, and never lets it affect
/// another category's query.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("malformed response from {endpoint}")]
    Malformed {
        endpoint: String,
        #[source]
        cause: serde_json::Error,
    },
}

/// Failure to obtain a position fix from the platform provider.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LocationError {
    #[error("location request timed out")]
    Timeout,

    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Failure reading from or writing to the connection store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection store write failed: {0}")]
    Write(String),

    #[error("connection store read failed: {0}")]
    Read(String),
}

/// Failure dispatching an outbound directive (camera PTZ, SDR tune/scan).
/// Surfaced to the caller of that specific command, never retried.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("command dispatch failed: {0}")]
    Dispatch(String),
}
