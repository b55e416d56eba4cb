//! PortWatch Engine - Central state management for the scan cycle.
//!
//! This module provides the engine that owns the configuration, the
//! per-port history and the previous snapshot. The scheduler drives
//! `scan_cycle()`; operator commands call `close_port()` concurrently.

use parking_lot::{Mutex, RwLock};

use tracing::{debug, info, warn};

use crate::adapters::{JsonSnapshotStore, SignalTerminator, SystemConnections};
use crate::application::{CloseOutcome, CloseTimings, PortCloser};
use crate::config::Config;
use crate::domain::{HistoryTracker, Snapshot, SnapshotDiff};
use crate::error::Result;
use crate::ports::{AlertSink, ConnectionSource, ProcessTerminator, SnapshotStore};

/// Result of one scan cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// The snapshot built this cycle.
    pub snapshot: Snapshot,
    /// Differences against the previous snapshot.
    pub diff: SnapshotDiff,
    /// Whether the alert sink was notified.
    pub alerted: bool,
}

/// State mutated only by the scan cycle.
#[derive(Default)]
struct ScanState {
    history: HistoryTracker,
    previous: Option<Snapshot>,
}

/// Engine wired to the OS adapters.
pub type SystemEngine = MonitorEngine<SystemConnections, SignalTerminator, JsonSnapshotStore>;

/// The main PortWatch engine.
///
/// Share it behind an `Arc` between the scan scheduler and the control path.
pub struct MonitorEngine<S, K, P>
where
    S: ConnectionSource,
    K: ProcessTerminator,
    P: SnapshotStore,
{
    // Components
    source: S,
    closer: PortCloser<K>,
    store: P,
    alerts: Box<dyn AlertSink>,

    // State
    config: RwLock<Config>,
    state: Mutex<ScanState>,

    // Held for the whole cycle so cycles never overlap
    cycle_lock: tokio::sync::Mutex<()>,
}

impl SystemEngine {
    /// Create an engine using the platform connection table and SIGTERM.
    pub fn system(
        config: Config,
        store: JsonSnapshotStore,
        alerts: impl AlertSink + 'static,
    ) -> Result<Self> {
        Self::new(
            config,
            SystemConnections::new(),
            SignalTerminator::new(),
            store,
            alerts,
        )
    }
}

impl<S, K, P> MonitorEngine<S, K, P>
where
    S: ConnectionSource,
    K: ProcessTerminator,
    P: SnapshotStore,
{
    /// Create a new engine instance.
    pub fn new(
        config: Config,
        source: S,
        terminator: K,
        store: P,
        alerts: impl AlertSink + 'static,
    ) -> Result<Self> {
        Ok(Self {
            source,
            closer: PortCloser::new(terminator),
            store,
            alerts: Box::new(alerts),
            config: RwLock::new(config.validated()?),
            state: Mutex::new(ScanState::default()),
            cycle_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Replace the wait bounds used by `close_port()`.
    pub fn with_close_timings(mut self, timings: CloseTimings) -> Self {
        self.closer.set_timings(timings);
        self
    }

    /// Perform a single scan cycle.
    ///
    /// Enumerates sockets, updates history, builds and persists a snapshot,
    /// diffs it against the previous one and notifies the alert sink when
    /// inactive ports are found. An enumeration failure leaves all state as it was.
    pub async fn scan_cycle(&self) -> Result<CycleReport> {
        let _cycle = self.cycle_lock.lock().await;

        let records = self.source.connections().await?;
        let config = self.config.read().clone();

        let snapshot = {
            let mut state = self.state.lock();
            Snapshot::build(
                &records,
                &config.whitelist,
                config.inactive_threshold,
                &mut state.history,
            )
        };

        if let Err(e) = self.store.save(&snapshot).await {
            warn!(error = %e, "Failed to persist snapshot");
        }

        let diff = {
            let state = self.state.lock();
            SnapshotDiff::compute(state.previous.as_ref(), &snapshot, &config.whitelist)
        };

        if !diff.opened.is_empty() {
            info!(ports = ?diff.opened, "New listening ports");
        }
        if !diff.closed.is_empty() {
            info!(ports = ?diff.closed, "Ports closed");
        }

        let alerted = diff.should_alert(config.alert_enabled);
        if alerted {
            debug!(ports = ?diff.alertable, "Notifying alert sink");
            self.alerts.notify(&diff.alertable);
        }

        self.state.lock().previous = Some(snapshot.clone());

        Ok(CycleReport {
            snapshot,
            diff,
            alerted,
        })
    }

    // MARK: - Process Management

    /// Close a port on operator request.
    ///
    /// Whitelisted ports are left alone and reported as such. Otherwise the
    /// owning process is terminated as described on [`PortCloser`].
    pub async fn close_port(&self, port: u16) -> Result<CloseOutcome> {
        let whitelisted = self.config.read().is_whitelisted(port);
        if whitelisted {
            info!(port = port, "Refusing to close whitelisted port");
            return Ok(CloseOutcome::Whitelisted);
        }

        match self.closer.close(&self.source, port).await {
            Ok(outcome) => {
                info!(port = port, outcome = %outcome, "Close request finished");
                Ok(outcome)
            }
            Err(e) => {
                warn!(port = port, error = %e, "Close request failed");
                Err(e)
            }
        }
    }

    // MARK: - Configuration

    /// Get a copy of the current configuration.
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Replace the configuration. Takes effect from the next cycle.
    pub fn update_config(&self, config: Config) -> Result<()> {
        *self.config.write() = config.validated()?;
        Ok(())
    }

    /// Check if a port is whitelisted.
    pub fn is_whitelisted(&self, port: u16) -> bool {
        self.config.read().is_whitelisted(port)
    }

    // MARK: - State Access

    /// The snapshot the next cycle will be compared against.
    pub fn previous_snapshot(&self) -> Option<Snapshot> {
        self.state.lock().previous.clone()
    }

    /// Consecutive-scan counter for a port.
    pub fn history_count(&self, port: u16) -> Option<u32> {
        self.state.lock().history.count(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use crate::domain::{ConnectionRecord, PortState};
    use crate::error::Error;

    #[derive(Clone, Default)]
    struct MockSource {
        records: Arc<Mutex<Vec<ConnectionRecord>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl MockSource {
        fn set_listening(&self, ports: &[u16]) {
            *self.records.lock() = ports
                .iter()
                .map(|&p| ConnectionRecord::listening(p, Some(p as u32)))
                .collect();
        }
    }

    impl ConnectionSource for MockSource {
        async fn connections(&self) -> Result<Vec<ConnectionRecord>> {
            if *self.fail.lock() {
                return Err(Error::CommandFailed("ss: not found".into()));
            }
            Ok(self.records.lock().clone())
        }
    }

    struct MockTerminator {
        source: MockSource,
        terminated: Arc<Mutex<Vec<u32>>>,
    }

    impl ProcessTerminator for MockTerminator {
        async fn terminate(&self, pid: u32) -> Result<()> {
            self.terminated.lock().push(pid);
            self.source.records.lock().retain(|r| r.pid != Some(pid));
            Ok(())
        }

        fn is_running(&self, pid: u32) -> bool {
            self.source.records.lock().iter().any(|r| r.pid == Some(pid))
        }
    }

    #[derive(Clone, Default)]
    struct MockStore {
        saved: Arc<Mutex<Vec<Snapshot>>>,
        fail: bool,
    }

    impl SnapshotStore for MockStore {
        async fn save(&self, snapshot: &Snapshot) -> Result<()> {
            if self.fail {
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            self.saved.lock().push(snapshot.clone());
            Ok(())
        }
    }

    struct Fixture {
        engine: MonitorEngine<MockSource, MockTerminator, MockStore>,
        source: MockSource,
        store: MockStore,
        alerts: Arc<Mutex<Vec<BTreeSet<u16>>>>,
        terminated: Arc<Mutex<Vec<u32>>>,
    }

    fn fixture(config: Config, store: MockStore) -> Fixture {
        let source = MockSource::default();
        let alerts = Arc::new(Mutex::new(Vec::new()));
        let terminated = Arc::new(Mutex::new(Vec::new()));

        let sink_alerts = alerts.clone();
        let engine = MonitorEngine::new(
            config,
            source.clone(),
            MockTerminator {
                source: source.clone(),
                terminated: terminated.clone(),
            },
            store.clone(),
            move |ports: &BTreeSet<u16>| sink_alerts.lock().push(ports.clone()),
        )
        .unwrap()
        .with_close_timings(CloseTimings::immediate());

        Fixture {
            engine,
            source,
            store,
            alerts,
            terminated,
        }
    }

    fn config(whitelist: Vec<u16>, threshold: u32) -> Config {
        Config {
            period: 1,
            whitelist,
            inactive_threshold: threshold,
            alert_enabled: true,
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = MockStore::default();
        let source = MockSource::default();
        let terminator = MockTerminator {
            source: source.clone(),
            terminated: Arc::default(),
        };
        let result = MonitorEngine::new(
            config(vec![], 0),
            source,
            terminator,
            store,
            |_: &BTreeSet<u16>| {},
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_cycle_persists_and_retains_snapshot() {
        let f = fixture(config(vec![22], 3), MockStore::default());
        f.source.set_listening(&[8080]);

        let report = f.engine.scan_cycle().await.unwrap();
        assert_eq!(report.snapshot.state(8080), Some(PortState::OpenActive));
        assert_eq!(report.snapshot.state(22), Some(PortState::Whitelisted));
        assert_eq!(f.store.saved.lock().len(), 1);
        assert_eq!(f.engine.previous_snapshot(), Some(report.snapshot));
    }

    #[tokio::test]
    async fn test_enumeration_failure_leaves_state() {
        let f = fixture(config(vec![], 3), MockStore::default());
        f.source.set_listening(&[8080]);
        f.engine.scan_cycle().await.unwrap();
        let previous = f.engine.previous_snapshot();

        *f.source.fail.lock() = true;
        let result = f.engine.scan_cycle().await;

        assert!(result.is_err_and(|e| e.is_enumeration_failure()));
        assert_eq!(f.engine.history_count(8080), Some(1));
        assert_eq!(f.engine.previous_snapshot(), previous);
        assert_eq!(f.store.saved.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_not_fatal() {
        let store = MockStore {
            fail: true,
            ..MockStore::default()
        };
        let f = fixture(config(vec![], 1), store);
        f.source.set_listening(&[8080]);

        let report = f.engine.scan_cycle().await.unwrap();
        assert!(report.alerted);
        assert!(f.engine.previous_snapshot().is_some());
    }

    #[tokio::test]
    async fn test_alerts_disabled() {
        let mut cfg = config(vec![], 1);
        cfg.alert_enabled = false;
        let f = fixture(cfg, MockStore::default());
        f.source.set_listening(&[8080]);

        let report = f.engine.scan_cycle().await.unwrap();
        assert_eq!(report.diff.alertable, BTreeSet::from([8080]));
        assert!(!report.alerted);
        assert!(f.alerts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_whitelist_added_mid_run_suppresses_alert() {
        let f = fixture(config(vec![], 2), MockStore::default());
        f.source.set_listening(&[8080]);

        f.engine.scan_cycle().await.unwrap();
        f.engine.scan_cycle().await.unwrap();
        assert_eq!(f.alerts.lock().len(), 1);

        f.engine.update_config(config(vec![8080], 2)).unwrap();
        let report = f.engine.scan_cycle().await.unwrap();

        // Still labeled by its listening state, but no longer alertable.
        assert_eq!(report.snapshot.state(8080), Some(PortState::OpenInactive));
        assert!(report.diff.alertable.is_empty());
        assert_eq!(f.alerts.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_opened_and_closed_reported() {
        let f = fixture(config(vec![], 3), MockStore::default());
        f.source.set_listening(&[3000]);
        f.engine.scan_cycle().await.unwrap();

        f.source.set_listening(&[8080]);
        let report = f.engine.scan_cycle().await.unwrap();

        assert_eq!(report.diff.opened, BTreeSet::from([8080]));
        assert_eq!(report.diff.closed, BTreeSet::from([3000]));
        assert_eq!(f.engine.history_count(3000), None);
    }

    #[tokio::test]
    async fn test_close_whitelisted_port_refused() {
        let f = fixture(config(vec![22], 3), MockStore::default());
        f.source.set_listening(&[22]);

        let outcome = f.engine.close_port(22).await.unwrap();
        assert_eq!(outcome, CloseOutcome::Whitelisted);
        assert!(!outcome.is_closed());
        assert!(f.terminated.lock().is_empty());
    }

    #[tokio::test]
    async fn test_close_port_terminates_owner() {
        let f = fixture(config(vec![22], 3), MockStore::default());
        f.source.set_listening(&[22, 8080]);

        let outcome = f.engine.close_port(8080).await.unwrap();
        assert_eq!(outcome, CloseOutcome::Released { pid: 8080 });
        assert_eq!(*f.terminated.lock(), vec![8080]);
    }

    #[test]
    fn test_update_config_validates() {
        let f = fixture(config(vec![22], 3), MockStore::default());
        assert!(f.engine.update_config(config(vec![], 0)).is_err());
        assert_eq!(f.engine.config().inactive_threshold, 3);
        assert!(f.engine.is_whitelisted(22));
    }
}
