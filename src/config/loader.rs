//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use secrecy::SecretString;
use thiserror::Error;

use crate::config::schema::AdapterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `control_plane.password`.
pub const PASSWORD_ENV: &str = "ADAPTER_CP_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AdapterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, std::env::var(PASSWORD_ENV).ok())
}

/// Parse and validate configuration text, applying the password override.
pub fn parse_config(
    content: &str,
    password_override: Option<String>,
) -> Result<AdapterConfig, ConfigError> {
    let mut config: AdapterConfig = toml::from_str(content)?;

    if let Some(password) = password_override {
        config.control_plane.password = SecretString::from(password);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
