//! Subcommand implementations.

pub mod close;
pub mod config;
pub mod run;
pub mod scan;

use std::path::PathBuf;

use anyhow::Result;
use portwatch_core::{AlertSink, Config, ConfigStore, JsonSnapshotStore, SystemEngine};

/// Path overrides from the global flags.
pub struct Paths {
    pub config: Option<PathBuf>,
    pub logs: Option<PathBuf>,
}

impl Paths {
    pub fn config_store(&self) -> Result<ConfigStore> {
        Ok(match &self.config {
            Some(path) => ConfigStore::with_path(path.clone()),
            None => ConfigStore::new()?,
        })
    }

    pub fn snapshot_store(&self) -> Result<JsonSnapshotStore> {
        Ok(match &self.logs {
            Some(dir) => JsonSnapshotStore::with_dir(dir),
            None => JsonSnapshotStore::new()?,
        })
    }

    /// Load the configuration and wire an engine to the OS adapters.
    pub async fn engine(&self, alerts: impl AlertSink + 'static) -> Result<(Config, SystemEngine)> {
        let config = self.config_store()?.load().await?;
        let engine = SystemEngine::system(config.clone(), self.snapshot_store()?, alerts)?;
        Ok((config, engine))
    }
}
