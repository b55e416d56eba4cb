//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

pub mod connections;
pub mod snapshot_store;
pub mod terminator;

// Re-export main types for convenience
pub use connections::SystemConnections;
pub use snapshot_store::{JsonSnapshotStore, DEFAULT_RETENTION};
pub use terminator::SignalTerminator;
