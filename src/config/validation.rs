//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that at least one listener is enabled
//! - Check that the TLS listener has its certificate and key
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a [`ServerConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("root directory is empty")]
    MissingRoot,

    #[error("no http or https address configured")]
    NoListener,

    #[error("https listener requires both cert and key")]
    MissingTlsMaterial,

    #[error("invalid {field} address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("log.lines must be greater than zero")]
    ZeroLogLines,
}

/// Validate a server configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.root.as_os_str().is_empty() {
        errors.push(ValidationError::MissingRoot);
    }

    if config.http.address.is_empty() && config.https.address.is_empty() {
        errors.push(ValidationError::NoListener);
    }

    if !config.https.address.is_empty()
        && (config.https.cert.is_empty() || config.https.key.is_empty())
    {
        errors.push(ValidationError::MissingTlsMaterial);
    }

    for (field, value) in [
        ("http", &config.http.address),
        ("https", &config.https.address),
        ("command", &config.command.address),
    ] {
        if !value.is_empty() && value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.clone(),
            });
        }
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "metrics",
            value: config.metrics.address.clone(),
        });
    }

    if !config.log.file.is_empty() && config.log.lines == 0 {
        errors.push(ValidationError::ZeroLogLines);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
