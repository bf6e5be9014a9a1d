//! Observability utilities for robots.
//!
//! Exporters (Prometheus, JSON endpoints) live with the host; this crate owns
//! the counters they read and the tracing subscriber setup.

#![warn(missing_docs, clippy::pedantic)]

pub mod health;
pub mod tracing_support;

pub use health::{CountersSnapshot, RuntimeCounters};
pub use tracing_support::{TelemetryError, init_tracing};
