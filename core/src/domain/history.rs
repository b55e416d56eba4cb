//! Per-port consecutive-scan counters.

use std::collections::{BTreeMap, BTreeSet};

/// Tracks for how many back-to-back scans each port has been seen listening.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryTracker {
    counters: BTreeMap<u16, u32>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one scan worth of listening ports.
    ///
    /// New ports start at 0, every observed port is then bumped by one, and ports
    /// missing from `listening` are forgotten.
    pub fn observe(&mut self, listening: &BTreeSet<u16>) -> &BTreeMap<u16, u32> {
        self.counters.retain(|port, _| listening.contains(port));

        for &port in listening {
            let counter = self.counters.entry(port).or_insert(0);
            *counter = counter.saturating_add(1);
        }

        &self.counters
    }

    /// Current counter for a port, if tracked.
    pub fn count(&self, port: u16) -> Option<u32> {
        self.counters.get(&port).copied()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(list: &[u16]) -> BTreeSet<u16> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_first_observation_counts_one() {
        let mut history = HistoryTracker::new();
        let counters = history.observe(&ports(&[8080]));
        assert_eq!(counters.get(&8080), Some(&1));
    }

    #[test]
    fn test_consecutive_observations_accumulate() {
        let mut history = HistoryTracker::new();
        history.observe(&ports(&[8080, 22]));
        history.observe(&ports(&[8080, 22]));
        history.observe(&ports(&[8080]));

        assert_eq!(history.count(8080), Some(3));
        assert_eq!(history.count(22), None);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_gap_resets_counter() {
        let mut history = HistoryTracker::new();
        history.observe(&ports(&[3000]));
        history.observe(&ports(&[3000]));
        history.observe(&ports(&[]));
        assert!(history.is_empty());

        history.observe(&ports(&[3000]));
        assert_eq!(history.count(3000), Some(1));
    }
}
