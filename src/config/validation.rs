//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Addresses must parse, the endpoint path must be routable
//! - Size overrides must be usable by the upgrade primitive
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
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


pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    let path = &config.endpoint.path;
    if !path.starts_with('/') {
        errors.push(ValidationError::new("endpoint.path", "must start with `/`"));
    }

    let ws = &config.websocket;
    for (field, value) in [
        ("websocket.max_message_size", ws.max_message_size),
        ("websocket.max_frame_size", ws.max_frame_size),
        ("websocket.write_buffer_size", ws.write_buffer_size),
    ] {
        if value == Some(0) {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }
    if let (Some(frame), Some(message)) = (ws.max_frame_size, ws.max_message_size) {
        if frame > message {
            errors.push(ValidationError::new(
                "websocket.max_frame_size",
                format!("{} exceeds max_message_size {}", frame, message),
            ));
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
