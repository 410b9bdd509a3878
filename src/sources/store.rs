use super::error::{SourceError, StoreError};
use crate::connections::{ConnectionRecord, DiscoveredConnection};
use crate::geo::GeoPoint;
use async_trait::async_trait;

/// Auto-discovery scanner. Novelty detection lives on the collaborator
/// side: each call returns only encounters not reported before.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    async fn discover(&self, center: GeoPoint) -> Result<Vec<DiscoveredConnection>, SourceError>;
}

/// External persistence for connection records.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Persists one record and echoes back the stored form.
    async fn save(&self, record: ConnectionRecord) -> Result<ConnectionRecord, StoreError>;

    /// Returns every record persisted so far, oldest first.
    async fn load_all(&self) -> Result<Vec<ConnectionRecord>, StoreError>;
}
