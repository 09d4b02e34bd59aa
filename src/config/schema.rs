//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the adapter.
//! All types derive Serde traits for deserialization from config files.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Root configuration for the gateway adapter.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AdapterConfig {
    /// Control-plane connection and credentials.
    pub control_plane: ControlPlaneConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Control-plane (event hub) connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// Base URL of the control plane (e.g., "https://apim:9443").
    pub service_url: String,

    /// Username for the internal data API.
    pub username: String,

    /// Password for the internal data API.
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    /// Skip TLS certificate verification on the control-plane channel.
    ///
    /// The internal data API is usually served with a self-signed
    /// certificate inside a trusted network. Turning this on disables all
    /// server certificate checks for these requests.
    pub skip_tls_verification: bool,

    /// Extra CA bundle (PEM) trusted when verification is enabled.
    pub ca_cert_path: Option<String>,

    /// Value of the `gatewayLabel` query parameter.
    pub gateway_label: String,

    /// Value of the `type` query parameter.
    pub connector_type: String,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            service_url: "https://localhost:9443".to_string(),
            username: "admin".to_string(),
            password: SecretString::from(String::new()),
            skip_tls_verification: true,
            ca_cert_path: None,
            gateway_label: "Production and Sandbox".to_string(),
            connector_type: "Envoy".to_string(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Timeout configuration for control-plane calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Per-request timeout (connect + response + body) in seconds.
    pub request_secs: u64,

    /// Deadline for a whole load cycle in seconds.
    pub cycle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            cycle_secs: 120,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts per endpoint per cycle (including the first).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9091".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for the collection endpoints (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:9095".to_string(),
        }
    }
}
