//! Connection table adapters.
//!
//! Platform-specific implementations of connection enumeration.

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod unsupported;

mod endpoint;

use crate::domain::ConnectionRecord;
use crate::error::Result;
use crate::ports::ConnectionSource;

/// The connection source that uses platform-specific implementations.
pub struct SystemConnections {
    #[cfg(target_os = "macos")]
    inner: darwin::DarwinConnections,

    #[cfg(target_os = "linux")]
    inner: linux::LinuxConnections,

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    inner: unsupported::UnsupportedConnections,
}

impl SystemConnections {
    /// Create a connection source for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "macos")]
            inner: darwin::DarwinConnections::new(),

            #[cfg(target_os = "linux")]
            inner: linux::LinuxConnections::new(),

            #[cfg(not(any(target_os = "linux", target_os = "macos")))]
            inner: unsupported::UnsupportedConnections::new(),
        }
    }
}

impl Default for SystemConnections {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSource for SystemConnections {
    async fn connections(&self) -> Result<Vec<ConnectionRecord>> {
        self.inner.list().await
    }
}

/// Internal trait for platform-specific implementations.
trait Enumerator: Send + Sync {
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<ConnectionRecord>>> + Send;
}
