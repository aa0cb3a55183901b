//! Request handling and adaptation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every call
//! - Turn an Axum request into the relay's `InboundRequest`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Repeated header values are joined with ", " as HTTP allows
//! - Bodies must be UTF-8 text; the relay forwards them as strings

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};
use serde_json::json;
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::relay::error::{error_chain, JSON_CONTENT_TYPE};
use crate::relay::{CorsPolicy, InboundRequest, OutboundResponse};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Reasons an HTTP request cannot be described to the relay.
#[derive(Debug, Error)]
pub enum InboundError {
    #[error("failed to read request body: {0}")]
    Body(String),
    #[error("request body is not valid UTF-8")]
    NotUtf8,
}

impl InboundError {
    pub fn into_response(self, cors: &CorsPolicy) -> OutboundResponse {
        let body = json!({
            "error": "Invalid request body",
            "details": self.to_string(),
        });
        let mut response = OutboundResponse::new(400, body.to_string());
        response
            .headers
            .insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        cors.apply_origin(&mut response.headers);
        response
    }
}

/// Adapt an Axum request, reading at most `max_body_bytes` of body.
pub async fn into_inbound(
    request: Request<Body>,
    max_body_bytes: usize,
) -> Result<InboundRequest, InboundError> {
    let (parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| InboundError::Body(error_chain(&e)))?;
    let body = if bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8(bytes.to_vec()).map_err(|_| InboundError::NotUtf8)?)
    };

    Ok(InboundRequest {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        raw_query: parts.uri.query().map(str::to_owned),
        headers: flatten_headers(&parts.headers),
        body,
    })
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            tracing::debug!(header = %name, "Skipping non-text header value");
            continue;
        };
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    flat
}
