//! Snapshot persistence port (interface).

use crate::domain::Snapshot;
use crate::error::Result;

/// Port for persisting each cycle's snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Persist one snapshot record.
    fn save(&self, snapshot: &Snapshot) -> impl std::future::Future<Output = Result<()>> + Send;
}
