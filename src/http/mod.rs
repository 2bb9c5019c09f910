//! HTTP request instrumentation.
//!
//! This module provides:
//! - An axum middleware emitting one record per completed request
//! - [`LogFields`], the request-scoped builder handlers use to add fields

mod fields;
mod middleware;

// Re-export public API
pub use fields::LogFields;
pub use middleware::{instrument, level_for_status, log_requests, HttpLogging};
