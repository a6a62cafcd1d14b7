//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject cookie names that cannot appear in a `Cookie` header
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::http::cookies::SameSite;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

fn valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled && config.observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new("observability.log_format", "must be 'pretty' or 'json'"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    if config.session.lifetime_secs == 0 {
        errors.push(ValidationError::new("session.lifetime_secs", "must be greater than zero"));
    }

    if config.session.cleanup_interval_secs == 0 {
        errors.push(ValidationError::new("session.cleanup_interval_secs", "must be greater than zero"));
    }

    if !valid_cookie_name(&config.session.cookie_name) {
        errors.push(ValidationError::new("session.cookie_name", "invalid cookie name"));
    }

    if !valid_cookie_name(&config.csrf.cookie_name) {
        errors.push(ValidationError::new("csrf.cookie_name", "invalid cookie name"));
    }

    if config.csrf.cookie_name == config.session.cookie_name {
        errors.push(ValidationError::new("csrf.cookie_name", "must differ from session.cookie_name"));
    }

    if config.session.cookie_same_site == SameSite::None && !config.session.cookie_secure {
        errors.push(ValidationError::new(
            "session.cookie_same_site",
            "'none' requires session.cookie_secure",
        ));
    }

    if config.csrf.form_field.is_empty() {
        errors.push(ValidationError::new("csrf.form_field", "must not be empty"));
    }

    if axum::http::HeaderName::from_bytes(config.csrf.header_name.as_bytes()).is_err() {
        errors.push(ValidationError::new("csrf.header_name", "invalid header name"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
