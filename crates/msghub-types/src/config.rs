//! Configuration for the hub and the client-side peer.
//!
//! Loaded from `~/.msghub/config.toml` (or an explicit path) with every field
//! optional; missing files and parse failures fall back to defaults.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default read and write deadline.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default per-agent outbound queue capacity.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 100;
/// Default executor command queue capacity.
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;
/// Default listen address of the daemon.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9817";
/// Default hub URL for clients.
pub const DEFAULT_URL: &str = "ws://localhost:9817";

/// What an outbound queue does when a message arrives and it is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Refuse the new message; the send fails.
    #[default]
    RejectNewest,
    /// Evict the oldest queued message to make room; the eviction is reported.
    DropOldest,
}

/// Hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Address the daemon binds to.
    pub listen_addr: SocketAddr,
    /// Read deadline per frame, in seconds.
    pub read_timeout_secs: u64,
    /// Write deadline per frame, in seconds.
    pub write_timeout_secs: u64,
    /// Outbound queue capacity per agent. Values below 1 are raised to 1.
    pub outbound_capacity: usize,
    /// Executor command queue capacity. Values below 1 are raised to 1.
    pub command_capacity: usize,
    /// Behavior of a full outbound queue.
    pub overflow_policy: OverflowPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9817)),
            read_timeout_secs: DEFAULT_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_TIMEOUT_SECS,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl HubConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    /// Outbound capacity with the minimum of 1 applied.
    pub fn effective_outbound_capacity(&self) -> usize {
        self.outbound_capacity.max(1)
    }

    /// Command capacity with the minimum of 1 applied.
    pub fn effective_command_capacity(&self) -> usize {
        self.command_capacity.max(1)
    }
}

/// Client-side peer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket URL of the hub.
    pub url: String,
    /// Read deadline per frame, in seconds.
    pub read_timeout_secs: u64,
    /// Write deadline per frame, in seconds.
    pub write_timeout_secs: u64,
    /// Capacity of the pending outbound queue.
    pub outbound_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            read_timeout_secs: DEFAULT_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_TIMEOUT_SECS,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MsghubConfig {
    /// `[hub]` table.
    pub hub: HubConfig,
    /// `[client]` table.
    pub client: ClientConfig,
}

/// Default config file location: `~/.msghub/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".msghub"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

/// Load configuration from a TOML file, with defaults.
pub fn load_config(path: Option<&Path>) -> MsghubConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return MsghubConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<MsghubConfig>(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                MsghubConfig::default()
            }
        },
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            MsghubConfig::default()
        }
    }
}
