//! Periodic scan driver.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::engine::{CycleReport, MonitorEngine};
use crate::error::Result;
use crate::ports::{ConnectionSource, ProcessTerminator, SnapshotStore};

/// Stops a running [`ScanScheduler`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Ask the scheduler to stop. The in-flight cycle, if any, completes first.
    pub fn stop(&self) {
        let _ = self.tx.send(true);
    }
}

/// Runs scan cycles on the engine every `period` until stopped.
///
/// The period is re-read from the engine's configuration after each cycle.
/// Cycle failures are logged and the next cycle runs as scheduled.
pub struct ScanScheduler<S, K, P>
where
    S: ConnectionSource,
    K: ProcessTerminator,
    P: SnapshotStore,
{
    engine: Arc<MonitorEngine<S, K, P>>,
    stop: watch::Receiver<bool>,
}

impl<S, K, P> ScanScheduler<S, K, P>
where
    S: ConnectionSource + 'static,
    K: ProcessTerminator + 'static,
    P: SnapshotStore + 'static,
{
    /// Create a scheduler and the handle that stops it.
    ///
    /// Keep the handle alive for as long as the scheduler should run.
    pub fn new(engine: Arc<MonitorEngine<S, K, P>>) -> (Self, StopHandle) {
        let (tx, rx) = watch::channel(false);
        let handle = StopHandle { tx: Arc::new(tx) };
        (Self { engine, stop: rx }, handle)
    }

    /// Run until stopped. Returns the number of cycles attempted.
    pub async fn run(mut self) -> u64 {
        let mut cycles = 0;
        info!("Scan scheduler started");

        loop {
            let stopped = *self.stop.borrow();
            if stopped {
                break;
            }

            cycles += 1;
            log_cycle(cycles, self.engine.scan_cycle().await);

            let period = self.engine.config().period();
            tokio::select! {
                _ = sleep(period) => {}
                changed = self.stop.changed() => {
                    // Dropping every handle counts as a stop request.
                    let stopped = changed.is_err() || *self.stop.borrow();
                    if stopped {
                        break;
                    }
                }
            }
        }

        info!(cycles = cycles, "Scan scheduler stopped");
        cycles
    }

    /// Run the scheduler on a background task.
    pub fn spawn(self) -> JoinHandle<u64> {
        tokio::spawn(self.run())
    }

    /// Run exactly `count` cycles back to back, without sleeping.
    pub async fn run_cycles(&self, count: usize) -> Vec<Result<CycleReport>> {
        let mut reports = Vec::with_capacity(count);
        for _ in 0..count {
            reports.push(self.engine.scan_cycle().await);
        }
        reports
    }
}

fn log_cycle(cycle: u64, result: Result<CycleReport>) {
    match result {
        Ok(report) => debug!(
            cycle = cycle,
            ports = report.snapshot.len(),
            changed = report.diff.has_changes(),
            alerted = report.alerted,
            "Scan cycle complete"
        ),
        Err(e) => warn!(cycle = cycle, error = %e, "Scan cycle failed"),
    }
}
