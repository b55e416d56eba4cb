//! Snapshot-to-snapshot differencing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{PortState, Snapshot};

/// What changed between two consecutive snapshots, and what deserves an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    /// Listening ports absent from the previous snapshot.
    pub opened: BTreeSet<u16>,
    /// Ports present in the previous snapshot but gone from the current one.
    pub closed: BTreeSet<u16>,
    /// Inactive, non-whitelisted ports in the current snapshot.
    pub alertable: BTreeSet<u16>,
}

impl SnapshotDiff {
    /// Compare `current` against `previous`.
    ///
    /// Without a previous snapshot `opened` and `closed` stay empty. `alertable`
    /// only depends on `current` and the whitelist.
    pub fn compute(previous: Option<&Snapshot>, current: &Snapshot, whitelist: &[u16]) -> Self {
        let (opened, closed) = match previous {
            Some(previous) => {
                let opened = current
                    .ports()
                    .iter()
                    .filter(|(port, state)| state.is_open() && !previous.contains(**port))
                    .map(|(&port, _)| port)
                    .collect();
                let closed = previous
                    .ports()
                    .keys()
                    .filter(|port| !current.contains(**port))
                    .copied()
                    .collect();
                (opened, closed)
            }
            None => (BTreeSet::new(), BTreeSet::new()),
        };

        let alertable = current
            .ports_with(PortState::OpenInactive)
            .into_iter()
            .filter(|port| !whitelist.contains(port))
            .collect();

        Self {
            opened,
            closed,
            alertable,
        }
    }

    /// Whether the alert sink should be invoked.
    pub fn should_alert(&self, alert_enabled: bool) -> bool {
        alert_enabled && !self.alertable.is_empty()
    }

    /// Whether any port opened or closed.
    pub fn has_changes(&self) -> bool {
        !self.opened.is_empty() || !self.closed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn snapshot(entries: &[(u16, PortState)]) -> Snapshot {
        Snapshot::from_parts(Utc::now(), entries.iter().copied().collect::<BTreeMap<_, _>>())
    }

    #[test]
    fn test_first_cycle_has_no_changes() {
        let current = snapshot(&[(8080, PortState::OpenInactive), (22, PortState::Whitelisted)]);
        let diff = SnapshotDiff::compute(None, &current, &[22]);

        assert!(!diff.has_changes());
        assert_eq!(diff.alertable, BTreeSet::from([8080]));
    }

    #[test]
    fn test_opened_and_closed() {
        let previous = snapshot(&[(3000, PortState::OpenActive), (22, PortState::Whitelisted)]);
        let current = snapshot(&[
            (8080, PortState::OpenActive),
            (9090, PortState::OpenInactive),
            (22, PortState::Whitelisted),
            (443, PortState::Whitelisted),
        ]);

        let diff = SnapshotDiff::compute(Some(&previous), &current, &[22, 443]);
        assert_eq!(diff.opened, BTreeSet::from([8080, 9090]));
        assert_eq!(diff.closed, BTreeSet::from([3000]));
        assert!(diff.opened.is_disjoint(&diff.closed));
    }

    #[test]
    fn test_whitelist_to_listening_is_not_opened() {
        // 22 existed as a placeholder, so it is not new even though it now listens.
        let previous = snapshot(&[(22, PortState::Whitelisted)]);
        let current = snapshot(&[(22, PortState::OpenActive)]);

        let diff = SnapshotDiff::compute(Some(&previous), &current, &[22]);
        assert!(diff.opened.is_empty());
        assert!(diff.closed.is_empty());
    }

    #[test]
    fn test_alertable_excludes_whitelist() {
        let current = snapshot(&[(8080, PortState::OpenInactive), (5432, PortState::OpenInactive)]);
        let diff = SnapshotDiff::compute(None, &current, &[5432]);

        assert_eq!(diff.alertable, BTreeSet::from([8080]));
    }

    #[test]
    fn test_should_alert() {
        let current = snapshot(&[(8080, PortState::OpenInactive)]);
        let diff = SnapshotDiff::compute(None, &current, &[]);
        assert!(diff.should_alert(true));
        assert!(!diff.should_alert(false));

        let quiet = SnapshotDiff::compute(None, &snapshot(&[(8080, PortState::OpenActive)]), &[]);
        assert!(!quiet.should_alert(true));
    }
}
