//! Signal-based process terminator.
//!
//! Uses the standard Unix signals:
//! - SIGTERM (15): Graceful termination request
//! - signal 0: Existence check without delivering anything

use tracing::debug;

use crate::error::{Error, Result};
use crate::ports::ProcessTerminator;

/// Terminates processes with SIGTERM.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalTerminator;

impl SignalTerminator {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl ProcessTerminator for SignalTerminator {
    async fn terminate(&self, pid: u32) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};

        let raw = to_raw_pid(pid)?;
        debug!(pid = pid, signal = "SIGTERM", "Sending signal to process");

        kill(nix::unistd::Pid::from_raw(raw), Signal::SIGTERM).map_err(|errno| {
            let reason = match errno {
                Errno::ESRCH => "no such process".to_string(),
                Errno::EPERM => "permission denied".to_string(),
                other => other.desc().to_string(),
            };
            Error::TerminationFailed { pid, reason }
        })
    }

    fn is_running(&self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::kill;

        let Ok(raw) = to_raw_pid(pid) else {
            return false;
        };

        match kill(nix::unistd::Pid::from_raw(raw), None) {
            Ok(()) => true,
            // Exists, but owned by someone else.
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

#[cfg(not(unix))]
impl ProcessTerminator for SignalTerminator {
    async fn terminate(&self, pid: u32) -> Result<()> {
        Err(Error::UnsupportedPlatform(format!(
            "cannot terminate process {} on {}",
            pid,
            std::env::consts::OS
        )))
    }

    fn is_running(&self, _pid: u32) -> bool {
        false
    }
}

/// PIDs 0 and above `i32::MAX` address process groups or nothing at all.
#[cfg(unix)]
fn to_raw_pid(pid: u32) -> Result<i32> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Ok(raw),
        _ => Err(Error::TerminationFailed {
            pid,
            reason: "invalid process id".to_string(),
        }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_running() {
        let terminator = SignalTerminator::new();
        assert!(terminator.is_running(std::process::id()));
    }

    #[test]
    fn test_invalid_pid() {
        let terminator = SignalTerminator::new();
        assert!(!terminator.is_running(0));
        assert!(!terminator.is_running(u32::MAX));
    }

    #[tokio::test]
    async fn test_terminate_invalid_pid_fails() {
        let terminator = SignalTerminator::new();
        let result = terminator.terminate(0).await;
        assert!(matches!(result, Err(Error::TerminationFailed { pid: 0, .. })));
    }

    #[tokio::test]
    async fn test_terminate_child_process() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        let terminator = SignalTerminator::new();

        terminator.terminate(child.id()).await.unwrap();
        let status = child.wait().unwrap();
        assert!(!status.success());
    }
}
