//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the application server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname or IP to bind (e.g., "127.0.0.1").
    pub hostname: String,

    /// TCP port to bind. Port 0 asks the OS for an ephemeral port.
    pub port: u16,

    /// Upper bound on shutdown latency: once a drain begins, the process is
    /// forcibly terminated after this many milliseconds if the drain has not
    /// completed. The default exceeds the common 120s orchestrator window by
    /// a 10s margin so the sibling timeout fires first.
    pub graceful_exit_timeout_ms: u64,

    /// Enable gzip response compression.
    pub compress: bool,

    /// Maximum accepted request body size in bytes.
    pub body_limit_bytes: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Serve a JSON error page for unmatched routes.
    pub error_pages: bool,

    /// Logging configuration.
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 3000,
            graceful_exit_timeout_ms: 130_000,
            compress: true,
            body_limit_bytes: 1024 * 1024,
            request_timeout_secs: 30,
            error_pages: true,
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Escalation deadline as a [`Duration`].
    pub fn graceful_exit_timeout(&self) -> Duration {
        Duration::from_millis(self.graceful_exit_timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for log files. When unset, logs go to stdout.
    pub dir: Option<String>,

    /// Default tracing filter, overridable via `RUST_LOG`.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filter: "app_server=debug,tower_http=debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.graceful_exit_timeout_ms, 130_000);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert!(config.compress);
    }

    #[test]
    fn empty_toml_deserializes_to_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, ServerConfig::default().port);
        assert!(config.log.dir.is_none());
    }
}
