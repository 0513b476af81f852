//! Gateway configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `SHARDGATE_CONFIG` env var
//! 3. **Environment variables**: `SHARDGATE__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`GeneralSettings`]: routing policy flags, sync-check cadence, timeouts
//! - `observers`: the sharded observer node list
//! - `full_history_nodes`: optional full-history node list (may be empty)
//!
//! # Validation
//!
//! Configuration is validated at load time. Invalid configurations (empty
//! observer list, malformed addresses) return errors rather than failing
//! silently. Per-shard eligibility (every shard has at least one
//! non-snapshotless node) is enforced at registry construction, where shard
//! partitioning happens anyway.
//!
//! # Example
//!
//! ```toml
//! [general]
//! balanced_observers = true
//! sync_check_interval_seconds = 6
//!
//! [[observers]]
//! address = "http://10.0.0.10:8080"
//! shard_id = 0
//!
//! [[observers]]
//! address = "http://10.0.0.20:8080"
//! shard_id = 4294967295
//! ```

use std::{path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::types::NodeData;

/// Routing and probing behavior shared by every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Use the circular-queue (balanced) provider for observers instead of
    /// fixed config order. Defaults to `true`.
    #[serde(default = "default_true")]
    pub balanced_observers: bool,

    /// Same policy flag, for the full-history pool. Defaults to `true`.
    #[serde(default = "default_true")]
    pub balanced_full_history_nodes: bool,

    /// Interval between sync-state probe passes in seconds. Must be greater
    /// than 0. Defaults to `6`.
    #[serde(default = "default_sync_check_interval_seconds")]
    pub sync_check_interval_seconds: u64,

    /// A node is considered synced when its probable highest nonce is within
    /// this many nonces of its current nonce. Defaults to `5`.
    #[serde(default = "default_sync_tolerance_nonces")]
    pub sync_tolerance_nonces: u64,

    /// Per-request timeout towards observers in seconds. Defaults to `10`.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_true() -> bool {
    true
}

fn default_sync_check_interval_seconds() -> u64 {
    6
}

fn default_sync_tolerance_nonces() -> u64 {
    5
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            balanced_observers: true,
            balanced_full_history_nodes: true,
            sync_check_interval_seconds: 6,
            sync_tolerance_nonces: 5,
            request_timeout_seconds: 10,
        }
    }
}

/// One configured observer node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverEntry {
    /// Base URL of the node, e.g. `http://10.0.0.10:8080`.
    pub address: String,

    /// Shard this node serves. `4294967295` is the metachain.
    pub shard_id: u32,

    /// Use this node only when no regular node is available for its shard.
    #[serde(default)]
    pub is_fallback: bool,

    /// Node serves only recent state; belongs to the `Recent` availability
    /// partition.
    #[serde(default)]
    pub is_snapshotless: bool,
}

impl ObserverEntry {
    /// Converts the static entry into a registry node, initially synced.
    #[must_use]
    pub fn to_node(&self) -> NodeData {
        NodeData {
            address: self.address.clone(),
            shard_id: self.shard_id,
            is_fallback: self.is_fallback,
            is_snapshotless: self.is_snapshotless,
            is_synced: true,
        }
    }
}

/// Root gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Routing policy and probing settings.
    #[serde(default)]
    pub general: GeneralSettings,

    /// The sharded observer list. Cannot be empty.
    #[serde(default)]
    pub observers: Vec<ObserverEntry>,

    /// Full-history nodes. May be empty, in which case full-history-only
    /// endpoints are served by a disabled provider.
    #[serde(default)]
    pub full_history_nodes: Vec<ObserverEntry>,
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Environment variables with the `SHARDGATE__` prefix can override any
    /// value, using `__` as the nesting separator (e.g.
    /// `SHARDGATE__GENERAL__SYNC_CHECK_INTERVAL_SECONDS=10`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or
    /// deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()))
            .add_source(Environment::with_prefix("SHARDGATE").separator("__"))
            .build()?;

        builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml`, overridable through the
    /// `SHARDGATE_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("SHARDGATE_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.observers.is_empty() {
            return Err("no observer nodes configured".to_string());
        }

        for entry in self.observers.iter().chain(self.full_history_nodes.iter()) {
            if entry.address.is_empty() {
                return Err(format!("empty address for shard {} node", entry.shard_id));
            }
            if !entry.address.starts_with("http") {
                return Err(format!(
                    "invalid address for shard {} node: {}",
                    entry.shard_id, entry.address
                ));
            }
        }

        if self.general.sync_check_interval_seconds == 0 {
            return Err("sync check interval must be greater than 0".to_string());
        }

        if self.general.request_timeout_seconds == 0 {
            return Err("request timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Returns the observer entries as registry nodes, preserving file order.
    #[must_use]
    pub fn observer_nodes(&self) -> Vec<NodeData> {
        self.observers.iter().map(ObserverEntry::to_node).collect()
    }

    /// Returns the full-history entries as registry nodes, preserving file order.
    #[must_use]
    pub fn full_history_node_list(&self) -> Vec<NodeData> {
        self.full_history_nodes.iter().map(ObserverEntry::to_node).collect()
    }

    /// Returns the node list for the requested pool.
    #[must_use]
    pub fn nodes_for(&self, node_type: crate::types::NodeType) -> Vec<NodeData> {
        match node_type {
            crate::types::NodeType::Observers => self.observer_nodes(),
            crate::types::NodeType::FullHistoryNodes => self.full_history_node_list(),
        }
    }

    /// Returns the sync-check cadence as a [`Duration`].
    #[must_use]
    pub fn sync_check_interval(&self) -> Duration {
        Duration::from_secs(self.general.sync_check_interval_seconds)
    }

    /// Returns the per-request observer timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.general.request_timeout_seconds)
    }
}
