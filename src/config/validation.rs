//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the control-plane URL and credentials
//! - Validate value ranges (timeouts > 0, backoff bounds)
//! - Validate bind addresses of enabled listeners
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AdapterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::AdapterConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("control_plane.service_url '{url}' is invalid: {reason}")]
    InvalidServiceUrl { url: String, reason: String },

    #[error("control_plane.username must not be empty")]
    EmptyUsername,

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("timeouts.cycle_secs ({cycle}) must be >= timeouts.request_secs ({request})")]
    CycleShorterThanRequest { cycle: u64, request: u64 },

    #[error("retries.base_delay_ms ({base}) must be <= retries.max_delay_ms ({max})")]
    BackoffBounds { base: u64, max: u64 },

    #[error("observability.log_format '{0}' is not one of: pretty, json")]
    UnknownLogFormat(String),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &AdapterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let cp = &config.control_plane;
    match Url::parse(&cp.service_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidServiceUrl {
            url: cp.service_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidServiceUrl {
            url: cp.service_url.clone(),
            reason: e.to_string(),
        }),
    }
    if cp.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.cycle_secs", timeouts.cycle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue { field });
        }
    }
    if timeouts.cycle_secs < timeouts.request_secs {
        errors.push(ValidationError::CycleShorterThanRequest {
            cycle: timeouts.cycle_secs,
            request: timeouts.request_secs,
        });
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroValue { field: "retries.max_attempts" });
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::BackoffBounds {
            base: retries.base_delay_ms,
            max: retries.max_delay_ms,
        });
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(obs.log_format.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: obs.metrics_address.clone(),
        });
    }

    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }

    if cp.skip_tls_verification && cp.ca_cert_path.is_some() {
        tracing::warn!("control_plane.ca_cert_path is ignored while skip_tls_verification is enabled");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AdapterConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AdapterConfig::default();
        config.control_plane.service_url = "ftp://cp.example".to_string();
        config.control_plane.username = "  ".to_string();
        config.timeouts.request_secs = 0;
        config.retries.base_delay_ms = 10_000;
        config.observability.log_format = "xml".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidServiceUrl { .. }));
        assert!(errors.contains(&ValidationError::EmptyUsername));
        assert!(errors.contains(&ValidationError::ZeroValue { field: "timeouts.request_secs" }));
        assert!(errors.contains(&ValidationError::BackoffBounds { base: 10_000, max: 5000 }));
        assert!(errors.contains(&ValidationError::UnknownLogFormat("xml".to_string())));
    }

    #[test]
    fn test_cycle_must_cover_request_timeout() {
        let mut config = AdapterConfig::default();
        config.timeouts.request_secs = 60;
        config.timeouts.cycle_secs = 30;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::CycleShorterThanRequest { cycle: 30, request: 60 }]
        );
    }

    #[test]
    fn test_disabled_admin_address_not_checked() {
        let mut config = AdapterConfig::default();
        config.admin.enabled = false;
        config.admin.bind_address = "not-an-address".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
