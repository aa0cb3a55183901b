//! Response handling and transformation.
//!
//! Turns the relay's `OutboundResponse` into an HTTP response. Header
//! entries that are not valid HTTP are dropped with a warning rather than
//! failing the whole response.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::relay::OutboundResponse;

impl IntoResponse for OutboundResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or_else(|_| {
            tracing::warn!(status = self.status_code, "Invalid status code, answering 502");
            StatusCode::BAD_GATEWAY
        });

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        response
    }
}
