//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::{ServiceConfig, StoreBackend};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),
    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("store.connection_string is required for the postgres backend")]
    MissingConnectionString,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let positive = [
        ("listener.max_body_bytes", config.listener.max_body_bytes as u64),
        ("health_check.interval_secs", config.health_check.interval_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("store.max_connections", u64::from(config.store.max_connections)),
        ("store.connect_timeout_secs", config.store.connect_timeout_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if config.store.backend == StoreBackend::Postgres
        && config
            .store
            .connection_string
            .as_deref()
            .map_or(true, str::is_empty)
    {
        errors.push(ValidationError::MissingConnectionString);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
