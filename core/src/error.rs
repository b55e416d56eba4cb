//! Error types for the portwatch-core library.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for portwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning sockets and reclaiming ports.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// The live connection bound to the port has no resolvable owner.
    #[error("No owning process found for port {port}")]
    NoOwningProcess { port: u16 },

    /// The termination request was rejected.
    #[error("Failed to terminate process {pid}: {reason}")]
    TerminationFailed { pid: u32, reason: String },

    /// The process did not exit within the wait bound.
    #[error("Process {pid} did not exit within {timeout:?}")]
    ExitTimeout { pid: u32, timeout: Duration },

    /// The port is still bound after the owning process was terminated.
    #[error("Port {port} is still active")]
    StillActive { port: u16 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform not supported.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),
}

impl Error {
    /// Whether this error comes from querying the OS connection table.
    pub fn is_enumeration_failure(&self) -> bool {
        matches!(
            self,
            Error::CommandFailed(_) | Error::ParseError(_) | Error::UnsupportedPlatform(_)
        )
    }
}
