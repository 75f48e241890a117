//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener configuration (bind address, TLS, limits).
    pub listener: ListenerConfig,

    /// Trans server connection settings.
    pub trans: TransConfig,

    /// Token validation settings.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Total time allowed to serve one HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 60,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Trans server connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransConfig {
    /// Trans server host.
    pub host: String,

    /// Trans server port.
    pub port: u16,

    /// Per-attempt dial timeout and whole-exchange deadline, in seconds.
    pub timeout_secs: u64,

    /// Commands this gateway may forward, separated by '|'.
    pub allowed_commands: String,

    /// Dial retry schedule.
    pub retry: RetryConfig,
}

impl TransConfig {
    /// `host:port` of the Trans server.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TransConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 20005,
            timeout_secs: 15,
            allowed_commands: "transinfo".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

/// How the wait between dial attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Wait `interval_secs` before every retry.
    Constant,
    /// Double the wait each retry, capped at `max_interval_secs`.
    Exponential,
}

/// Dial retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the first failed dial.
    pub attempts: u32,

    /// Base wait between dial attempts in seconds.
    pub interval_secs: u64,

    /// Backoff growth.
    pub strategy: BackoffStrategy,

    /// Upper bound for exponential backoff in seconds.
    pub max_interval_secs: u64,

    /// Add up to 10% random jitter to each wait.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            interval_secs: 5,
            strategy: BackoffStrategy::Constant,
            max_interval_secs: 60,
            jitter: false,
        }
    }
}

/// Token validation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Expected bearer token. Empty disables validation.
    pub api_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: "test".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:8877".to_string(),
        }
    }
}
