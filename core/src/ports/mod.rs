//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod alert;
mod connections;
mod store;
mod terminator;

pub use alert::AlertSink;
pub use connections::ConnectionSource;
pub use store::SnapshotStore;
pub use terminator::ProcessTerminator;
