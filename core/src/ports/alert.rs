//! Alert sink port (interface).

use std::collections::BTreeSet;

/// Receives the ports that crossed the inactivity threshold.
///
/// Called synchronously from the scan cycle, so implementations must return
/// promptly. The engine never retries a notification.
pub trait AlertSink: Send + Sync {
    fn notify(&self, ports: &BTreeSet<u16>);
}

impl<F> AlertSink for F
where
    F: Fn(&BTreeSet<u16>) + Send + Sync,
{
    fn notify(&self, ports: &BTreeSet<u16>) {
        self(ports)
    }
}
