//! Configuration schema definitions.
//!
//! This module defines the server settings structure. It is distinct from the
//! routes document that lives inside the served folder: settings are read once
//! at startup, routes are watched and reloaded.

use serde::{Deserialize, Serialize};

use crate::routing::MatcherKind;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, port, server name).
    pub listener: ListenerConfig,

    /// Routing behaviour.
    pub routing: RoutingConfig,

    /// Routes-file reload settings.
    pub reload: ReloadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1").
    pub bind_address: String,

    /// Port to listen on. 0 picks an ephemeral port.
    pub port: u16,

    /// Value of the `Server` response header.
    pub server_name: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            server_name: "foldserve".to_string(),
        }
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Name of the routes document inside the served folder.
    pub routes_file: String,

    /// Evaluation order of the matcher chain.
    pub matcher_order: Vec<MatcherKind>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            routes_file: "routes.json".to_string(),
            matcher_order: MatcherKind::DEFAULT_ORDER.to_vec(),
        }
    }
}

/// Stable-read settings used when the routes file changes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Attempts at reading a file that is not being written to.
    pub max_read_attempts: u32,

    /// Base delay between attempts in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            max_read_attempts: 3,
            base_delay_ms: 20,
            max_delay_ms: 200,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
