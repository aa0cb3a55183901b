//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay and server produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through all log lines of a call
//! - Metrics are cheap and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
