//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the token signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
/// Environment variable overriding `listener.bind_address`.
pub const BIND_ADDRESS_ENV: &str = "LEOCONNECT_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    finish(config)
}

/// Load from `path` when given, otherwise start from defaults.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => finish(AppConfig::default()),
    }
}

fn finish(mut config: AppConfig) -> Result<AppConfig, ConfigError> {
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides through `lookup` so tests need not touch the process env.
pub fn apply_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(secret) = lookup(JWT_SECRET_ENV).filter(|s| !s.is_empty()) {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(addr) = lookup(BIND_ADDRESS_ENV) {
        config.listener.bind_address = addr;
    }
}
