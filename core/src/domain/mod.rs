//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod connection;
mod diff;
mod history;
mod snapshot;

// Re-export all domain types
pub use connection::{ConnectionRecord, ConnectionStatus, Protocol};
pub use diff::SnapshotDiff;
pub use history::HistoryTracker;
pub use snapshot::{PortState, Snapshot};
