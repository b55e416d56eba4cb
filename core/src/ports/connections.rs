//! Connection source port (interface).

use crate::domain::ConnectionRecord;
use crate::error::Result;

/// Port for querying the OS connection table.
///
/// Implementations return every socket they can see, in any state. Callers
/// filter for listening sockets themselves.
pub trait ConnectionSource: Send + Sync {
    /// List the current connection records.
    fn connections(&self) -> impl std::future::Future<Output = Result<Vec<ConnectionRecord>>> + Send;
}
