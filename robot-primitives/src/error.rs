//! Shared error definitions for robot primitives.

use thiserror::Error;

/// Result alias used throughout the robot runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The provided robot identifier failed validation.
    #[error("invalid robot id `{id}`: {reason}")]
    InvalidRobotId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The sensor `type` discriminator is not one of the supported kinds.
    #[error("unknown sensor type `{0}`")]
    UnknownSensorKind(String),
}
