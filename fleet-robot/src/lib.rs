//! Fleet robot startup SDK facade.
//!
//! Bundles the robot crates behind feature flags so embedding hosts can pull
//! in only the configuration pipeline, or the full kernel.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use robot_primitives as primitives;

/// Configuration validation and secret resolution (enabled by `config` feature).
#[cfg(feature = "config")]
pub use robot_config as config;

/// Counters and tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use robot_telemetry as telemetry;

/// Robot lifecycle kernel (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use robot_kernel as kernel;
