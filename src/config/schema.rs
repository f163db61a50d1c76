//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the search
//! front-end. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the search front-end.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream search API settings.
    pub search: SearchConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Log sinks and severity.
    pub logging: LoggingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Replace the port of the bind address, keeping the host.
    pub fn set_port(&mut self, port: u16) {
        let host = match self.bind_address.rsplit_once(':') {
            Some((host, _)) => host,
            None => self.bind_address.as_str(),
        };
        let host = if host.is_empty() { "0.0.0.0" } else { host };
        self.bind_address = format!("{}:{}", host, port);
    }
}

/// Upstream search API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// MediaWiki API endpoint.
    pub endpoint: String,

    /// Results per page (`srlimit`).
    pub page_size: u32,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,

    /// Honor `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub system_proxy: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
            page_size: 20,
            timeout_secs: 30,
            system_proxy: true,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Logging configuration.
///
/// The severity threshold normally comes from `LOG_LEVEL`; `level` is only
/// consulted when the variable is unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback level (debug, info, warn, error).
    pub level: Option<String>,

    /// Colorize the console level.
    pub console_ansi: bool,

    /// Rotating JSON file sink.
    pub file: FileSinkConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            console_ansi: true,
            file: FileSinkConfig::default(),
        }
    }
}

/// Rotating file sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileSinkConfig {
    /// Disable to log to the console only.
    pub enabled: bool,

    /// Live log file path.
    pub path: String,

    /// Rotate once the live file would exceed this many megabytes.
    pub max_size_mb: u64,

    /// Number of rotated files to keep (0 keeps all).
    pub max_backups: usize,

    /// Delete rotated files older than this many days (0 disables).
    pub max_age_days: u64,

    /// Gzip rotated files.
    pub compress: bool,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "logs/app.log".to_string(),
            max_size_mb: 5,
            max_backups: 10,
            max_age_days: 14,
            compress: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.search.page_size, 20);
        assert_eq!(config.logging.file.path, "logs/app.log");
        assert_eq!(config.logging.file.max_size_mb, 5);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [search]
            page_size = 50

            [logging.file]
            max_backups = 3
            compress = false
            "#,
        )
        .unwrap();

        assert_eq!(config.search.page_size, 50);
        assert_eq!(config.search.timeout_secs, 30);
        assert_eq!(config.logging.file.max_backups, 3);
        assert!(!config.logging.file.compress);
        assert_eq!(config.logging.file.max_age_days, 14);
    }

    #[test]
    fn test_set_port() {
        let mut listener = ListenerConfig::default();
        listener.set_port(8081);
        assert_eq!(listener.bind_address, "0.0.0.0:8081");

        let mut listener = ListenerConfig {
            bind_address: "127.0.0.1:1".to_string(),
        };
        listener.set_port(4000);
        assert_eq!(listener.bind_address, "127.0.0.1:4000");
    }
}
