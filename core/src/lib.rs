//! PortWatch Core Library
//!
//! Local endpoint monitor for listening sockets.
//! Provides functionality to:
//! - Enumerate TCP/UDP sockets with their owning process
//! - Track how many consecutive scans each port has been listening
//! - Build labeled snapshots and diff them against the previous one
//! - Alert on inactive, non-whitelisted ports
//! - Reclaim a port by terminating its owner (SIGTERM, bounded waits)
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - Linux: Uses the `ss` command
//! - macOS: Uses the `lsof` command
//! - Other platforms: enumeration reports `UnsupportedPlatform`

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod engine;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    ConnectionRecord, ConnectionStatus, HistoryTracker, PortState, Protocol, Snapshot,
    SnapshotDiff,
};

// Re-export other commonly used types
pub use adapters::{JsonSnapshotStore, SignalTerminator, SystemConnections};
pub use application::{CloseOutcome, CloseTimings, PortCloser, ScanScheduler, StopHandle};
pub use config::{Config, ConfigStore};
pub use engine::{CycleReport, MonitorEngine, SystemEngine};
pub use error::{Error, Result};
pub use ports::{AlertSink, ConnectionSource, ProcessTerminator, SnapshotStore};
