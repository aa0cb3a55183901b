//! HTTP hosting surface for the relay.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, mount check)
//!     → request.rs (request ID, adapt into InboundRequest)
//!     → relay::RequestRelay::handle
//!     → response.rs (OutboundResponse → HTTP response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{into_inbound, InboundError, MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
