//! Remote cluster configuration

use crate::execution::LOCAL_CLUSTER_ALIAS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry of configured remote clusters
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteClustersConfig {
    /// Remote clusters by alias
    #[serde(default)]
    pub remotes: BTreeMap<String, RemoteClusterSettings>,
}

/// Per-remote connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteClusterSettings {
    /// Seed addresses used to establish the remote connection
    #[serde(default)]
    pub seeds: Vec<String>,

    /// When true, unreachability of this cluster degrades the result
    /// instead of failing the query
    #[serde(default = "default_skip_unavailable")]
    pub skip_unavailable: bool,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

fn default_skip_unavailable() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    5000
}

impl Default for RemoteClusterSettings {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            skip_unavailable: default_skip_unavailable(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

impl RemoteClustersConfig {
    /// skip_unavailable policy for `alias`. The local cluster never skips;
    /// unconfigured aliases get the default.
    pub fn skip_unavailable(&self, alias: &str) -> bool {
        if alias == LOCAL_CLUSTER_ALIAS {
            return false;
        }
        self.remotes
            .get(alias)
            .map(|remote| remote.skip_unavailable)
            .unwrap_or_else(default_skip_unavailable)
    }

    /// Configured remote aliases in lexical order
    pub fn remote_aliases(&self) -> Vec<String> {
        self.remotes.keys().cloned().collect()
    }

    pub fn connect_timeout_ms(&self, alias: &str) -> u64 {
        self.remotes
            .get(alias)
            .map(|remote| remote.connect_timeout_ms)
            .unwrap_or_else(default_connect_timeout)
    }
}
