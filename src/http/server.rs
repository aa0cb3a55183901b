//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener
//! - Dispatch mounted requests to the relay
//! - Swap in a new relay when the configuration changes

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, RelayConfig};
use crate::http::request::{into_inbound, MakeRequestUuidV4, X_REQUEST_ID};
use crate::relay::RequestRelay;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ArcSwap<RequestRelay>>,
    pub max_body_bytes: usize,
}

/// HTTP server exposing the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        let relay = RequestRelay::from_config(&config)?;
        let state = AppState {
            relay: Arc::new(ArcSwap::from_pointee(relay)),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(health_handler))
            .fallback(relay_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        request_id = %request_id,
                        method = %request.method(),
                        path = %request.uri().path()
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the active relay;
    /// in-flight calls finish on the relay they started with.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let relay = self.state.relay.clone();
        let listener_config = self.config.listener.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                if new_config.listener.bind_address != listener_config.bind_address
                    || new_config.listener.max_body_bytes != listener_config.max_body_bytes
                {
                    tracing::warn!("Listener settings changed; restart required to apply them");
                }
                match RequestRelay::from_config(&new_config) {
                    Ok(new_relay) => {
                        relay.store(Arc::new(new_relay));
                        tracing::info!(
                            upstream_host = %new_config.upstream.host,
                            upstream_port = new_config.upstream.port,
                            "Relay configuration reloaded"
                        );
                    }
                    Err(e) => tracing::error!(error = %e, "Rejected configuration update"),
                }
            }
        });

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

#[derive(Serialize)]
struct HealthStatus {
    version: &'static str,
    status: &'static str,
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

fn is_mounted(path: &str, mount_prefix: &str) -> bool {
    match path.strip_prefix(mount_prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Adapts mounted requests into relay calls; everything else is 404.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let relay = state.relay.load_full();

    if !is_mounted(request.uri().path(), relay.mount_prefix()) {
        tracing::debug!(path = %request.uri().path(), "Path outside mount prefix");
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    match into_inbound(request, state.max_body_bytes).await {
        Ok(inbound) => relay.handle(inbound).await.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected inbound request");
            e.into_response(relay.cors()).into_response()
        }
    }
}
