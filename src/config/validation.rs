//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and returns every
//! problem found, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// Longest accepted rate-limit window or cache TTL (one year).
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if config.store.op_timeout_ms == 0 {
        errors.push(ValidationError::new("store.op_timeout_ms", "must be greater than 0"));
    }
    if config.rate_limit.threshold == 0 {
        errors.push(ValidationError::new("rate_limit.threshold", "must be greater than 0"));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
    } else if config.rate_limit.window_secs > MAX_TTL_SECS {
        errors.push(ValidationError::new(
            "rate_limit.window_secs",
            format!("must be at most {MAX_TTL_SECS}"),
        ));
    }
    if config.cache.default_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.default_ttl_secs", "must be greater than 0"));
    } else if config.cache.default_ttl_secs > MAX_TTL_SECS {
        errors.push(ValidationError::new(
            "cache.default_ttl_secs",
            format!("must be at most {MAX_TTL_SECS}"),
        ));
    }
    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::new("circuit_breaker.failure_threshold", "must be greater than 0"));
    }
    if !(0.0..=1.0).contains(&config.external.failure_rate) {
        errors.push(ValidationError::new(
            "external.failure_rate",
            format!("{} is outside [0, 1]", config.external.failure_rate),
        ));
    }
    if config.external.timeout_ms == 0 {
        errors.push(ValidationError::new("external.timeout_ms", "must be greater than 0"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
