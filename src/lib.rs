//! HTTP request relay for the file-transfer API.
//!
//! Accepts calls under a mount prefix, forwards them to a fixed upstream
//! backend, and answers with the upstream's response plus permissive CORS
//! headers.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{InboundRequest, OutboundResponse, RequestRelay};
