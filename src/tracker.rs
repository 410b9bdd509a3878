//! Owns the observer's current position and bounded path history.
use crate::geo::GeoPoint;
use crate::sources::{FixRequest, LocationProvider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::warn;

/// One position fix on the observer's path.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: f64,
    pub timestamp: DateTime<Utc>,
}

impl TrackPoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

#[derive(Default)]
struct TrackState {
    current: Option<TrackPoint>,
    path: VecDeque<TrackPoint>,
}

/// Maintains the current position and the walked path.
///
/// The path is a bounded ring buffer, oldest point first; when full, the
/// oldest point is evicted. Only this component mutates it. Readers get
/// owned copies through [`current_position`](Self::current_position) and
/// [`recent_path`](Self::recent_path).
pub struct LocationTracker {
    provider: Arc<dyn LocationProvider>,
    fix_timeout: Duration,
    path_capacity: usize,
    state: RwLock<TrackState>,
}

impl LocationTracker {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        fix_timeout: Duration,
        path_capacity: usize,
    ) -> Self {
        Self {
            provider,
            fix_timeout,
            path_capacity,
            state: RwLock::new(TrackState::default()),
        }
    }

    /// Requests one fresh position fix and appends it to the path.
    ///
    /// The request disallows cached fixes and is capped at the configured
    /// timeout even if the provider ignores its request options. Any
    /// failure is logged and leaves the current position and path exactly
    /// as they were; the next tick simply tries again.
    pub async fn advance(&self) -> Option<TrackPoint> {
        let request = FixRequest {
            timeout_ms: self.fix_timeout.as_millis() as u64,
            ..FixRequest::default()
        };
        let fix = match tokio::time::timeout(self.fix_timeout, self.provider.request_fix(request))
            .await
        {
            Ok(Ok(fix)) => fix,
            Ok(Err(error)) => {
                warn!(%error, "position fix failed, keeping last known position");
                return None;
            }
            Err(_) => {
                warn!("position fix timed out, keeping last known position");
                return None;
            }
        };

        let point = TrackPoint {
            lat: fix.lat,
            lon: fix.lon,
            accuracy_m: fix.accuracy_m,
            timestamp: Utc::now(),
        };

        let mut state = self.state.write().expect("track state lock poisoned");
        state.current = Some(point);
        if state.path.len() == self.path_capacity {
            state.path.pop_front();
        }
        state.path.push_back(point);
        Some(point)
    }

    /// Last known position, or `None` before the first successful fix.
    pub fn current_position(&self) -> Option<TrackPoint> {
        self.state.read().expect("track state lock poisoned").current
    }

    /// The last `k` path points, oldest first. Fewer if the path is shorter.
    pub fn recent_path(&self, k: usize) -> Vec<TrackPoint> {
        let state = self.state.read().expect("track state lock poisoned");
        let skip = state.path.len().saturating_sub(k);
        state.path.iter().skip(skip).copied().collect()
    }

    pub fn path_len(&self) -> usize {
        self.state.read().expect("track state lock poisoned").path.len()
    }
}
