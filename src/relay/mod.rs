//! Request relay subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (host event or adapted HTTP request)
//!     → OPTIONS? cors.rs answers the preflight, done
//!     → translate.rs (strip mount prefix, build upstream URL)
//!     → handler.rs (build outbound request, send, buffer body, under timeout)
//!     → success: upstream status/body + Content-Type + CORS
//!     → failure: error.rs maps timeout → 504, network → 500
//!     → OutboundResponse
//! ```
//!
//! # Design Decisions
//! - Exactly one response per call; nothing escapes `handle` as an error
//! - No retries, no caching, no state shared between calls
//! - Upstream non-2xx statuses pass through untouched

pub mod cors;
pub mod error;
pub mod event;
pub mod handler;
pub mod translate;

pub use cors::CorsPolicy;
pub use error::RelayError;
pub use event::{InboundRequest, OutboundResponse};
pub use handler::RequestRelay;
pub use translate::{translate_path, Upstream};
