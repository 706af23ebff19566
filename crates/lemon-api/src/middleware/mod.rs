//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - `tower_http::trace::TraceLayer`: request/response tracing
//!   (layered in `lib.rs`).
//! - [`metrics`]: Prometheus-compatible request metrics.

pub mod metrics;
