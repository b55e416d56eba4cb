//! Process terminator port (interface).

use crate::error::Result;

/// Port for terminating processes.
///
/// This trait defines the interface for process termination.
/// Implementations handle platform-specific signal handling.
pub trait ProcessTerminator: Send + Sync {
    /// Request graceful termination of a process (SIGTERM on unix).
    ///
    /// Returns once the request is delivered; it does not wait for the exit.
    fn terminate(&self, pid: u32) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Check if a process is still running.
    fn is_running(&self, pid: u32) -> bool;
}
