//! Relay failure taxonomy and its mapping onto responses.
//!
//! Upstream non-2xx answers are not errors here; they pass through verbatim.

use serde_json::json;
use thiserror::Error;

use crate::relay::cors::CorsPolicy;
use crate::relay::event::OutboundResponse;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum RelayError {
    /// The upstream exchange did not finish within the budget.
    #[error("upstream request to {target_url} timed out")]
    Timeout { target_url: String },

    /// Connecting, sending, or reading the body failed.
    #[error("upstream request to {target_url} failed: {details}")]
    Network { target_url: String, details: String },

    /// The inbound description cannot be turned into an HTTP request.
    #[error("cannot relay request to {target_url}: {details}")]
    InvalidRequest { target_url: String, details: String },
}

impl RelayError {
    pub fn network(target_url: &str, err: &(dyn std::error::Error + 'static)) -> Self {
        Self::Network {
            target_url: target_url.to_string(),
            details: error_chain(err),
        }
    }

    pub fn invalid(target_url: &str, err: &(dyn std::error::Error + 'static)) -> Self {
        Self::InvalidRequest {
            target_url: target_url.to_string(),
            details: error_chain(err),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Timeout { .. } => 504,
            Self::Network { .. } => 500,
            Self::InvalidRequest { .. } => 400,
        }
    }

    /// Label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Network { .. } => "network_error",
            Self::InvalidRequest { .. } => "invalid_request",
        }
    }

    /// Render the structured JSON error response.
    pub fn into_response(self, cors: &CorsPolicy) -> OutboundResponse {
        let status = self.status_code();
        let body = match self {
            Self::Timeout { target_url } => json!({
                "error": "Request timeout",
                "targetUrl": target_url,
            }),
            Self::Network { target_url, details } => json!({
                "error": "Proxy request failed",
                "details": details,
                "targetUrl": target_url,
            }),
            Self::InvalidRequest { target_url, details } => json!({
                "error": "Invalid request",
                "details": details,
                "targetUrl": target_url,
            }),
        };

        let mut response = OutboundResponse::new(status, body.to_string());
        response
            .headers
            .insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        cors.apply_origin(&mut response.headers);
        response
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
