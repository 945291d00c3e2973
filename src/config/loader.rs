//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

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

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

/// Apply the well-known environment variables on top of `config`.
///
/// `lookup` abstracts the environment so overrides can be tested in isolation.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("APP_PORT") {
        let port: u16 = parse_var("APP_PORT", v)?;
        let host = config
            .server
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.bind_address = format!("{}:{}", host, port);
    }
    if let Some(v) = lookup("REDIS_HOST") {
        config.store.redis_host = v;
    }
    if let Some(v) = lookup("REDIS_PORT") {
        config.store.redis_port = parse_var("REDIS_PORT", v)?;
    }
    if let Some(v) = lookup("RATE_LIMIT_THRESHOLD") {
        config.rate_limit.threshold = parse_var("RATE_LIMIT_THRESHOLD", v)?;
    }
    if let Some(v) = lookup("RATE_LIMIT_WINDOW_SECONDS") {
        config.rate_limit.window_secs = parse_var("RATE_LIMIT_WINDOW_SECONDS", v)?;
    }
    if let Some(v) = lookup("EXTERNAL_SERVICE_FAILURE_RATE") {
        config.external.failure_rate = parse_var("EXTERNAL_SERVICE_FAILURE_RATE", v)?;
    }
    if let Some(v) = lookup("CIRCUIT_BREAKER_FAILURE_THRESHOLD") {
        config.circuit_breaker.failure_threshold = parse_var("CIRCUIT_BREAKER_FAILURE_THRESHOLD", v)?;
    }
    if let Some(v) = lookup("CIRCUIT_BREAKER_RESET_TIMEOUT") {
        config.circuit_breaker.reset_timeout_secs = parse_var("CIRCUIT_BREAKER_RESET_TIMEOUT", v)?;
    }
    if let Some(v) = lookup("CACHE_DEFAULT_TTL") {
        config.cache.default_ttl_secs = parse_var("CACHE_DEFAULT_TTL", v)?;
    }
    Ok(())
}
