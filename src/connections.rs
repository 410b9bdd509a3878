//! Persistence of notable sensor encounters with recent path context.
use crate::geo::GeoPoint;
use crate::sources::ConnectionStore;
use crate::tracker::TrackPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// An encounter reported by the auto-discovery collaborator, before the
/// engine stamps it with location, time and path context.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredConnection {
    /// Sensor type as reported by the discovery source, e.g. "wifi".
    pub kind: String,
    pub ssid: Option<String>,
    pub name: Option<String>,
    /// Opaque payload passed through from the discovery source.
    pub credentials: Option<Value>,
    /// Data URL of a capture associated with the encounter.
    pub image: Option<String>,
    pub devices: Option<Vec<String>>,
}

/// A persisted sensor encounter. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub kind: String,
    pub ssid: Option<String>,
    pub name: Option<String>,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
    pub credentials: Option<Value>,
    pub image: Option<String>,
    pub devices: Option<Vec<String>>,
    /// The observer's last path points at the moment of discovery.
    pub path_context: Vec<TrackPoint>,
}

/// Stamps discovered encounters, submits them to the connection store and
/// mirrors the persisted history in memory.
pub struct ConnectionLog {
    store: Arc<dyn ConnectionStore>,
    path_context_len: usize,
    saved: RwLock<Vec<ConnectionRecord>>,
}

impl ConnectionLog {
    pub fn new(store: Arc<dyn ConnectionStore>, path_context_len: usize) -> Self {
        Self {
            store,
            path_context_len,
            saved: RwLock::new(Vec::new()),
        }
    }

    /// How many trailing path points get attached to each record.
    pub fn path_context_len(&self) -> usize {
        self.path_context_len
    }

    /// Replaces the in-memory history with whatever the store holds.
    /// A failed read logs and leaves the history empty.
    pub async fn load_all(&self) {
        match self.store.load_all().await {
            Ok(records) => {
                info!(count = records.len(), "loaded saved connections");
                *self.saved.write().expect("saved connections lock poisoned") = records;
            }
            Err(error) => {
                warn!(%error, "failed to load saved connections");
                self.saved
                    .write()
                    .expect("saved connections lock poisoned")
                    .clear();
            }
        }
    }

    /// Builds a record from one discovered encounter and persists it.
    ///
    /// Only a successful write lands in the in-memory history, so a record
    /// appears exactly once or not at all. A failed write is logged and the
    /// candidate dropped; there is no retry.
    pub async fn record(
        &self,
        discovered: DiscoveredConnection,
        location: GeoPoint,
        path_context: Vec<TrackPoint>,
    ) {
        let record = ConnectionRecord {
            kind: discovered.kind,
            ssid: discovered.ssid,
            name: discovered.name,
            location,
            timestamp: Utc::now(),
            credentials: discovered.credentials,
            image: discovered.image,
            devices: discovered.devices,
            path_context,
        };
        match self.store.save(record).await {
            Ok(stored) => {
                info!(kind = %stored.kind, "connection persisted");
                self.saved
                    .write()
                    .expect("saved connections lock poisoned")
                    .push(stored);
            }
            Err(error) => {
                warn!(%error, "failed to persist connection, dropping it");
            }
        }
    }

    /// Owned snapshot of the persisted history, oldest first.
    pub fn saved(&self) -> Vec<ConnectionRecord> {
        self.saved
            .read()
            .expect("saved connections lock poisoned")
            .clone()
    }
}
