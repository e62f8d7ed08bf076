//! Configuration loading and validation

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use hostbeat_core::DeviceId;
use hostbeat_tracker::{HostEntry, ScanConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Devices to track: device id mapped to an IP address or a resolvable
    /// hostname
    pub hosts: BTreeMap<String, String>,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Ping-then-ARP rounds per host per pass
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,
    /// Interface to bind probes to (default route when unset)
    #[serde(default)]
    pub interface: Option<String>,
    /// Seconds between passes; computed from the host count when unset
    #[serde(default)]
    pub scan_interval_secs: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ping_count: default_ping_count(),
            interface: None,
            scan_interval_secs: None,
        }
    }
}

fn default_ping_count() -> u32 {
    1
}

/// Configuration rejected at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no hosts configured")]
    NoHosts,
    #[error("ping count must be at least 1")]
    ZeroPingCount,
}

impl Config {
    /// Reject configurations the tracker cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        if self.tracker.ping_count == 0 {
            return Err(ConfigError::ZeroPingCount);
        }
        Ok(())
    }

    /// Convert to ScanConfig
    pub fn to_scan_config(&self) -> ScanConfig {
        ScanConfig {
            hosts: self
                .hosts
                .iter()
                .map(|(device_id, ip)| HostEntry {
                    device_id: DeviceId::new(device_id.clone()),
                    ip_address: ip.clone(),
                })
                .collect(),
            ping_count: self.tracker.ping_count,
            interface: self.tracker.interface.clone(),
            scan_interval: self.tracker.scan_interval_secs.map(Duration::from_secs),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    info!(
        path = %path.display(),
        hosts = config.hosts.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Save a starter configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let mut hosts = BTreeMap::new();
    hosts.insert("laptop".to_string(), "192.168.1.10".to_string());
    hosts.insert("phone".to_string(), "192.168.1.20".to_string());

    let config = Config {
        hosts,
        tracker: TrackerConfig::default(),
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}
