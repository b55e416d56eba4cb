//! Labeled port snapshots.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConnectionRecord, HistoryTracker};

// ============================================================================
// PortState
// ============================================================================

/// Label given to a port in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortState {
    /// Listening, counter still below the threshold.
    OpenActive,
    /// Listening, counter at or above the threshold.
    OpenInactive,
    /// Not listening but whitelisted.
    #[serde(rename = "whitelist")]
    Whitelisted,
}

impl PortState {
    /// Whether the port was observed listening.
    pub fn is_open(&self) -> bool {
        matches!(self, PortState::OpenActive | PortState::OpenInactive)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PortState::OpenActive => "open (active)",
            PortState::OpenInactive => "open (inactive)",
            PortState::Whitelisted => "whitelisted",
        }
    }
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// One timestamped, fully labeled view of the relevant ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    timestamp: DateTime<Utc>,
    ports: BTreeMap<u16, PortState>,
}

impl Snapshot {
    /// Build a snapshot from the live connection table, stamped with the current time.
    ///
    /// Updates `history` with the listening ports found in `records`.
    pub fn build(
        records: &[ConnectionRecord],
        whitelist: &[u16],
        inactive_threshold: u32,
        history: &mut HistoryTracker,
    ) -> Self {
        Self::build_at(Utc::now(), records, whitelist, inactive_threshold, history)
    }

    /// Same as [`Snapshot::build`] with an explicit timestamp.
    pub fn build_at(
        timestamp: DateTime<Utc>,
        records: &[ConnectionRecord],
        whitelist: &[u16],
        inactive_threshold: u32,
        history: &mut HistoryTracker,
    ) -> Self {
        let listening: BTreeSet<u16> = records
            .iter()
            .filter(|r| r.is_listening())
            .map(|r| r.local_port)
            .collect();

        let mut ports: BTreeMap<u16, PortState> = history
            .observe(&listening)
            .iter()
            .map(|(&port, &count)| {
                let state = if count >= inactive_threshold {
                    PortState::OpenInactive
                } else {
                    PortState::OpenActive
                };
                (port, state)
            })
            .collect();

        // Whitelist never overrides an observed listening state.
        for &port in whitelist {
            ports.entry(port).or_insert(PortState::Whitelisted);
        }

        Self { timestamp, ports }
    }

    /// Assemble a snapshot from already-labeled ports.
    pub fn from_parts(timestamp: DateTime<Utc>, ports: BTreeMap<u16, PortState>) -> Self {
        Self { timestamp, ports }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn ports(&self) -> &BTreeMap<u16, PortState> {
        &self.ports
    }

    /// Label of a port, if present.
    pub fn state(&self, port: u16) -> Option<PortState> {
        self.ports.get(&port).copied()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains_key(&port)
    }

    /// Ports carrying the given label.
    pub fn ports_with(&self, state: PortState) -> BTreeSet<u16> {
        self.ports
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(&p, _)| p)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}
