//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the search orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Enable/disable the periodic search loop.
    /// When disabled, searches only run on demand.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between full searches over all active items.
    #[serde(default = "default_search_interval")]
    pub search_interval_secs: u64,

    /// Seconds to wait for an in-flight search when stopping.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_search_interval() -> u64 {
    86400 // daily
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            search_interval_secs: default_search_interval(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}
