//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that header names and values can actually be sent
//! - Check that the upstream forms a usable URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.host must not be empty")]
    EmptyUpstreamHost,
    #[error("upstream.port must be non-zero")]
    ZeroUpstreamPort,
    #[error("upstream `{0}` does not form a valid http URL")]
    InvalidUpstreamUrl(String),
    #[error("upstream.api_prefix `{0}` must start with '/'")]
    InvalidApiPrefix(String),
    #[error("mount.prefix `{0}` must start with '/' and not end with '/'")]
    InvalidMountPrefix(String),
    #[error("timeouts.upstream_ms must be greater than zero")]
    ZeroTimeout,
    #[error("`{0}` is not a valid header name")]
    InvalidHeaderName(String),
    #[error("{field} `{value}` is not a valid header value")]
    InvalidHeaderValue { field: &'static str, value: String },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let upstream = &config.upstream;

    if upstream.host.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamHost);
    }
    if upstream.port == 0 {
        errors.push(ValidationError::ZeroUpstreamPort);
    }
    if !upstream.api_prefix.starts_with('/') {
        errors.push(ValidationError::InvalidApiPrefix(upstream.api_prefix.clone()));
    }
    if !upstream.host.trim().is_empty() && upstream.port != 0 {
        let base = format!("http://{}:{}", upstream.host, upstream.port);
        let usable = Url::parse(&base)
            .map(|url| url.host_str().is_some() && url.path() == "/")
            .unwrap_or(false);
        if !usable {
            errors.push(ValidationError::InvalidUpstreamUrl(base));
        }
    }

    let prefix = &config.mount.prefix;
    if !prefix.starts_with('/') || prefix.ends_with('/') {
        errors.push(ValidationError::InvalidMountPrefix(prefix.clone()));
    }

    if config.timeouts.upstream_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for name in &upstream.forward_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    let header_values = [
        ("upstream.user_agent", &upstream.user_agent),
        ("cors.allow_origin", &config.cors.allow_origin),
        ("cors.allow_headers", &config.cors.allow_headers),
        ("cors.allow_methods", &config.cors.allow_methods),
    ];
    for (field, value) in header_values {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue {
                field,
                value: value.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
