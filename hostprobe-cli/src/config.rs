//! TOML configuration file.
//!
//! ```toml
//! [probe]
//! whois_timeout_secs = 5
//!
//! [load_test]
//! dispatch = "worker_pool"
//!
//! [storage]
//! enabled = true
//! db_path = "/var/lib/hostprobe/reports.db"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use hostprobe_toolbox::{LoadTestSettings, ProbeSettings};
use serde::Deserialize;

const APP_DIR: &str = "hostprobe";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub probe: ProbeSettings,
    pub load_test: LoadTestSettings,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,
    pub db_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: None,
        }
    }
}

impl StorageConfig {
    /// Configured database path, or `<data dir>/hostprobe/reports.db`.
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("reports.db")
        })
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Load the config file.
///
/// An explicit path must exist and parse. The default path is optional.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<CliConfig> {
    let Some(path) = explicit else {
        let path = default_config_path();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(CliConfig::default());
        }
        return read(&path);
    };
    read(path)
}

fn read(path: &Path) -> anyhow::Result<CliConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}
