//! Configuration management for the scan period, whitelist and alert settings.
//!
//! Stores configuration in JSON format at `~/.portwatch/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Scan period in seconds.
    #[serde(default = "default_period")]
    pub period: u64,

    /// Ports exempt from inactivity alerts.
    #[serde(default = "default_whitelist")]
    pub whitelist: Vec<u16>,

    /// Consecutive listening scans after which a port counts as inactive.
    #[serde(default = "default_inactive_threshold")]
    pub inactive_threshold: u32,

    /// Whether inactive ports are reported to the alert sink.
    #[serde(default = "default_true")]
    pub alert_enabled: bool,
}

fn default_period() -> u64 {
    60
}

fn default_whitelist() -> Vec<u16> {
    vec![22, 80, 443, 3389]
}

fn default_inactive_threshold() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            period: default_period(),
            whitelist: default_whitelist(),
            inactive_threshold: default_inactive_threshold(),
            alert_enabled: true,
        }
    }
}

impl Config {
    /// Scan period as a duration.
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period)
    }

    pub fn is_whitelisted(&self, port: u16) -> bool {
        self.whitelist.contains(&port)
    }

    /// Check invariants and drop duplicate whitelist entries (first one wins).
    pub fn validated(mut self) -> Result<Self> {
        if self.period == 0 {
            return Err(Error::Config("period must be a positive number of seconds".to_string()));
        }
        if self.inactive_threshold == 0 {
            return Err(Error::Config("inactive_threshold must be positive".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        self.whitelist.retain(|port| seen.insert(*port));

        Ok(self)
    }
}

/// Configuration store for managing app settings.
///
/// Handles reading and writing configuration to `~/.portwatch/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portwatch/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_dir = home.join(".portwatch");
        let config_path = config_dir.join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Get the configuration file path.
    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load configuration from disk.
    ///
    /// Writes and returns the default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            let config = Config::default();
            self.save(&config).await?;
            info!(path = %self.config_path.display(), "Created default configuration");
            return Ok(config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validated()
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        // Ensure config directory exists
        let config_dir = self.config_dir();
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        // Serialize with pretty printing
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Apply a change to the stored config and write it back validated.
    ///
    /// Nothing is written if the changed config fails validation.
    pub async fn update(&self, change: impl FnOnce(&mut Config)) -> Result<Config> {
        let mut config = self.load().await?;
        change(&mut config);
        let config = config.validated()?;
        self.save(&config).await?;
        Ok(config)
    }

    // =========================================================================
    // Whitelist
    // =========================================================================

    /// Add a port to the whitelist.
    pub async fn add_to_whitelist(&self, port: u16) -> Result<Config> {
        self.update(|c| c.whitelist.push(port)).await
    }

    /// Remove a port from the whitelist.
    pub async fn remove_from_whitelist(&self, port: u16) -> Result<Config> {
        self.update(|c| c.whitelist.retain(|p| *p != port)).await
    }
}
