//! Core shared types for fleet robots.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod sensor;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifier of a robot within the fleet.
pub use ids::RobotId;
/// Closed set of sensor kinds a robot may carry.
pub use sensor::SensorKind;
