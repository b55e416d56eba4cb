//! Port reclamation service.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ports::{ConnectionSource, ProcessTerminator};

/// Wait bounds used while closing a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseTimings {
    /// How long the owning process gets to exit after SIGTERM.
    pub exit_timeout: Duration,
    /// Pause before re-checking the connection table.
    pub settle: Duration,
    /// How often the exit wait polls the process.
    pub poll_interval: Duration,
}

impl Default for CloseTimings {
    fn default() -> Self {
        Self {
            exit_timeout: Duration::from_secs(3),
            settle: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl CloseTimings {
    /// Zero waits, for tests.
    pub fn immediate() -> Self {
        Self {
            exit_timeout: Duration::ZERO,
            settle: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
        }
    }
}

/// Successful (or refused) result of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The owning process exited and the port is free.
    Released { pid: u32 },
    /// Nothing was bound to the port.
    AlreadyClosed,
    /// The port is whitelisted; nothing was done.
    Whitelisted,
}

impl CloseOutcome {
    /// Whether the port is known to be free.
    pub fn is_closed(&self) -> bool {
        matches!(self, CloseOutcome::Released { .. } | CloseOutcome::AlreadyClosed)
    }
}

impl std::fmt::Display for CloseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseOutcome::Released { pid } => write!(f, "process {} terminated, port released", pid),
            CloseOutcome::AlreadyClosed => write!(f, "port was not in use"),
            CloseOutcome::Whitelisted => write!(f, "port is whitelisted and was left open"),
        }
    }
}

/// Terminates the process bound to a port and verifies the port is released.
///
/// Single attempt, no retries and no escalation to SIGKILL:
/// 1. Find the first live record on the port; no owner resolvable is a failure.
/// 2. SIGTERM the owner and wait up to `exit_timeout` for it to exit.
/// 3. Wait `settle`, then fail if anything still binds the port.
pub struct PortCloser<K: ProcessTerminator> {
    terminator: K,
    timings: CloseTimings,
}

impl<K: ProcessTerminator> PortCloser<K> {
    pub fn new(terminator: K) -> Self {
        Self::with_timings(terminator, CloseTimings::default())
    }

    pub fn with_timings(terminator: K, timings: CloseTimings) -> Self {
        Self { terminator, timings }
    }

    pub fn set_timings(&mut self, timings: CloseTimings) {
        self.timings = timings;
    }

    /// Close `port` using live data from `source`.
    pub async fn close<S: ConnectionSource>(&self, source: &S, port: u16) -> Result<CloseOutcome> {
        let records = source.connections().await?;

        let owner = match records.iter().find(|r| r.local_port == port) {
            Some(record) => Some(record.pid.ok_or(Error::NoOwningProcess { port })?),
            None => None,
        };

        if let Some(pid) = owner {
            debug!(port = port, pid = pid, "Terminating port owner");
            self.terminator.terminate(pid).await?;
            self.wait_for_exit(pid).await?;
            info!(port = port, pid = pid, "Process terminated");
        } else {
            debug!(port = port, "No live connection on port");
        }

        sleep(self.timings.settle).await;

        let still_bound = source
            .connections()
            .await?
            .iter()
            .any(|r| r.local_port == port);
        if still_bound {
            warn!(port = port, "Port still active after close attempt");
            return Err(Error::StillActive { port });
        }

        Ok(match owner {
            Some(pid) => CloseOutcome::Released { pid },
            None => CloseOutcome::AlreadyClosed,
        })
    }

    async fn wait_for_exit(&self, pid: u32) -> Result<()> {
        let poll = async {
            while self.terminator.is_running(pid) {
                sleep(self.timings.poll_interval).await;
            }
        };

        timeout(self.timings.exit_timeout, poll)
            .await
            .map_err(|_| Error::ExitTimeout {
                pid,
                timeout: self.timings.exit_timeout,
            })
    }
}
