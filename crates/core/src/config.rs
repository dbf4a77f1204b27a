//! Configuration management for GridLink nodes.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_id: String,
    pub listen_port: u16,
    pub log_json: bool,
    /// Optional path to a declarative signature policy description
    pub policy_file: Option<String>,
    pub routing: RoutingConfig,
}

/// Routing table behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Maximum binding age in seconds before an entry is considered stale.
    /// `None` disables expiry: entries live until explicit teardown.
    pub max_binding_age_secs: Option<u64>,
    /// Interval between reap passes, in seconds (ignored without a max age)
    pub reap_interval_secs: u64,
}

impl NodeConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            node_id: "LC-001".to_string(),
            listen_port: 9220,
            log_json: false,
            policy_file: None,
            routing: RoutingConfig {
                max_binding_age_secs: None,
                reap_interval_secs: 60,
            },
        }
    }
}
