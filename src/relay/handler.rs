//! The request relay: one inbound call in, one upstream exchange, one
//! response out.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, USER_AGENT};
use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode};
use futures_util::StreamExt;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{validate_config, ConfigError, RelayConfig, ValidationError};
use crate::observability::metrics;
use crate::relay::cors::CorsPolicy;
use crate::relay::error::{RelayError, JSON_CONTENT_TYPE};
use crate::relay::event::{InboundRequest, OutboundResponse};
use crate::relay::translate::{translate_path, Upstream};

/// What came back from upstream, fully buffered.
struct UpstreamReply {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
}

/// Forwards inbound calls to the configured upstream.
///
/// Holds no per-call state; a single instance serves any number of
/// concurrent calls.
#[derive(Clone)]
pub struct RequestRelay {
    client: Client<HttpConnector, Body>,
    upstream: Upstream,
    mount_prefix: String,
    cors: CorsPolicy,
    forward_headers: Vec<HeaderName>,
    user_agent: HeaderValue,
    timeout: Duration,
}

impl RequestRelay {
    /// Build a relay from a configuration, validating it first.
    pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let forward_headers = config
            .upstream
            .forward_headers
            .iter()
            .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok())
            .filter(|name| *name != CONTENT_TYPE && *name != USER_AGENT)
            .collect();
        let user_agent = HeaderValue::from_str(&config.upstream.user_agent).map_err(|_| {
            ConfigError::Validation(vec![ValidationError::InvalidHeaderValue {
                field: "upstream.user_agent",
                value: config.upstream.user_agent.clone(),
            }])
        })?;

        let upstream = Upstream::from_config(&config.upstream).map_err(|_| {
            ConfigError::Validation(vec![ValidationError::InvalidUpstreamUrl(format!(
                "http://{}:{}",
                config.upstream.host, config.upstream.port
            ))])
        })?;

        // No idle pooling: every call gets its own connection.
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Ok(Self {
            client,
            upstream,
            mount_prefix: config.mount.prefix.clone(),
            cors: CorsPolicy::from_config(&config.cors),
            forward_headers,
            user_agent,
            timeout: Duration::from_millis(config.timeouts.upstream_ms),
        })
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    /// Resolve the upstream URL an inbound request would be sent to.
    pub fn target_url(&self, request: &InboundRequest) -> String {
        let path = translate_path(&request.path, &self.mount_prefix);
        self.upstream.target_url(&path, request.raw_query.as_deref())
    }

    /// Relay one request. Every failure is mapped onto a response.
    pub async fn handle(&self, request: InboundRequest) -> OutboundResponse {
        let started = Instant::now();

        if request.is_preflight() {
            let response = self.cors.preflight();
            metrics::record_relay(&request.method, response.status_code, "preflight", started);
            return response;
        }

        let target_url = self.target_url(&request);
        tracing::info!(method = %request.method, target_url = %target_url, "Proxying request");

        let result = match tokio::time::timeout(self.timeout, self.exchange(&request, &target_url)).await {
            Ok(result) => result,
            // Dropping the exchange future closes the upstream connection.
            Err(_) => Err(RelayError::Timeout {
                target_url: target_url.clone(),
            }),
        };

        let (response, outcome) = match result {
            Ok(reply) => (self.success_response(reply), "success"),
            Err(err) => {
                match &err {
                    RelayError::Timeout { .. } => tracing::warn!(
                        target_url = %target_url,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Upstream request timed out"
                    ),
                    _ => tracing::error!(target_url = %target_url, error = %err, "Request error"),
                }
                let outcome = err.outcome();
                (err.into_response(&self.cors), outcome)
            }
        };

        metrics::record_relay(&request.method, response.status_code, outcome, started);
        response
    }

    async fn exchange(
        &self,
        request: &InboundRequest,
        target_url: &str,
    ) -> Result<UpstreamReply, RelayError> {
        let outbound = self
            .build_request(request, target_url)
            .map_err(|e| RelayError::invalid(target_url, &e))?;

        let response: axum::http::Response<Incoming> = self
            .client
            .request(outbound)
            .await
            .map_err(|e| RelayError::network(target_url, &e))?;

        let (parts, body) = response.into_parts();
        let mut chunks = Body::new(body).into_data_stream();
        let mut buffer = Vec::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| RelayError::network(target_url, &e))?;
            buffer.extend_from_slice(&chunk);
        }

        Ok(UpstreamReply {
            status: parts.status,
            content_type: parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            body: String::from_utf8_lossy(&buffer).into_owned(),
        })
    }

    fn build_request(
        &self,
        request: &InboundRequest,
        target_url: &str,
    ) -> Result<Request<Body>, axum::http::Error> {
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())?;

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(target_url)
            .header(
                CONTENT_TYPE,
                request.header(CONTENT_TYPE.as_str()).unwrap_or(JSON_CONTENT_TYPE),
            )
            .header(USER_AGENT, self.user_agent.clone());

        for name in &self.forward_headers {
            if let Some(value) = request.header(name.as_str()) {
                builder = builder.header(name, value);
            }
        }

        let body = match &request.body {
            Some(body) if method != Method::GET && !body.is_empty() => Body::from(body.clone()),
            _ => Body::empty(),
        };

        builder.body(body)
    }

    fn success_response(&self, reply: UpstreamReply) -> OutboundResponse {
        let mut response = OutboundResponse::new(reply.status.as_u16(), reply.body);
        response.headers.insert(
            "Content-Type".to_string(),
            reply
                .content_type
                .unwrap_or_else(|| JSON_CONTENT_TYPE.to_string()),
        );
        self.cors.apply(&mut response.headers);
        response
    }
}
