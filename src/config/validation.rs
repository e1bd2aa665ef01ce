//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts > 0, delays ordered, addresses parse)
//! - Reject matcher chains that are empty or repeat a matcher
//! - Keep the routes file inside the served folder
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::config::schema::ServerConfig;

/// A single semantic problem, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
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

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not an IP address", config.listener.bind_address),
        ));
    }

    let name = &config.listener.server_name;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        errors.push(ValidationError::new(
            "listener.server_name",
            "must be non-empty printable ASCII",
        ));
    }

    let routes_file = &config.routing.routes_file;
    if routes_file.is_empty()
        || routes_file.contains('/')
        || routes_file.contains('\\')
        || routes_file == "."
        || routes_file == ".."
    {
        errors.push(ValidationError::new(
            "routing.routes_file",
            format!("'{routes_file}' must be a bare file name"),
        ));
    }

    if config.routing.matcher_order.is_empty() {
        errors.push(ValidationError::new("routing.matcher_order", "must not be empty"));
    }
    let mut seen = HashSet::new();
    for kind in &config.routing.matcher_order {
        if !seen.insert(kind) {
            errors.push(ValidationError::new(
                "routing.matcher_order",
                format!("{kind:?} listed more than once"),
            ));
        }
    }

    if config.reload.max_read_attempts == 0 {
        errors.push(ValidationError::new("reload.max_read_attempts", "must be at least 1"));
    }
    if config.reload.max_delay_ms < config.reload.base_delay_ms {
        errors.push(ValidationError::new(
            "reload.max_delay_ms",
            "must not be smaller than reload.base_delay_ms",
        ));
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
