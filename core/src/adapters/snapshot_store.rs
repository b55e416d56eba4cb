//! JSON snapshot history on disk.
//!
//! Each snapshot is written to `<dir>/log_<unix-seconds>.json`. After every
//! write only the newest `retention` records are kept.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::domain::Snapshot;
use crate::error::{Error, Result};
use crate::ports::SnapshotStore;

/// Number of snapshot records kept by default.
pub const DEFAULT_RETENTION: usize = 10;

const FILE_PREFIX: &str = "log_";
const FILE_SUFFIX: &str = ".json";

/// Snapshot store writing one pretty-printed JSON file per cycle.
pub struct JsonSnapshotStore {
    dir: PathBuf,
    retention: usize,
}

impl JsonSnapshotStore {
    /// Create a store with the default path.
    ///
    /// Default path: `~/.portwatch/logs`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self::with_dir(home.join(".portwatch").join("logs")))
    }

    /// Create a store rooted at a custom directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            retention: DEFAULT_RETENTION,
        }
    }

    /// Keep at most `retention` records (at least one).
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    /// Stored record paths, oldest first.
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.dir).await?;
        let mut records: Vec<(i64, PathBuf)> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(ts) = name.to_str().and_then(record_timestamp) {
                records.push((ts, entry.path()));
            }
        }

        records.sort();
        Ok(records.into_iter().map(|(_, path)| path).collect())
    }

    /// Read one stored record back.
    pub async fn load(&self, path: &Path) -> Result<Snapshot> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Delete the oldest records beyond the retention limit.
    async fn rotate(&self) -> Result<()> {
        let records = self.list().await?;
        let excess = records.len().saturating_sub(self.retention);

        for path in records.into_iter().take(excess) {
            debug!(path = %path.display(), "Removing old snapshot record");
            fs::remove_file(&path).await?;
        }

        Ok(())
    }

    fn record_path(&self, snapshot: &Snapshot) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}",
            FILE_PREFIX,
            snapshot.timestamp().timestamp(),
            FILE_SUFFIX
        ))
    }
}

impl SnapshotStore for JsonSnapshotStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.record_path(snapshot), content).await?;

        self.rotate().await
    }
}

/// Timestamp embedded in a record file name, if it is one.
fn record_timestamp(name: &str) -> Option<i64> {
    name.strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PortState;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn snapshot_at(secs: i64) -> Snapshot {
        let ports = BTreeMap::from([(8080, PortState::OpenActive), (22, PortState::Whitelisted)]);
        Snapshot::from_parts(Utc.timestamp_opt(secs, 0).unwrap(), ports)
    }

    #[test]
    fn test_record_timestamp() {
        assert_eq!(record_timestamp("log_1700000000.json"), Some(1_700_000_000));
        assert_eq!(record_timestamp("log_abc.json"), None);
        assert_eq!(record_timestamp("config.json"), None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = JsonSnapshotStore::with_dir(dir.path().join("logs"));

        let snapshot = snapshot_at(1_700_000_000);
        store.save(&snapshot).await.unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].ends_with("log_1700000000.json"));

        let loaded = store.load(&records[0]).await.unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_retention_drops_oldest() {
        let dir = tempdir().unwrap();
        let store = JsonSnapshotStore::with_dir(dir.path()).with_retention(3);

        // Numeric order differs from lexicographic order here on purpose.
        for secs in [9, 10, 11, 100, 8] {
            store.save(&snapshot_at(secs)).await.unwrap();
        }

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["log_10.json", "log_11.json", "log_100.json"]);
    }

    #[tokio::test]
    async fn test_unrelated_files_untouched() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        let store = JsonSnapshotStore::with_dir(dir.path()).with_retention(1);

        store.save(&snapshot_at(1)).await.unwrap();
        store.save(&snapshot_at(2)).await.unwrap();

        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
