//! Error taxonomy for the configuration pipeline.

use std::path::PathBuf;

use robot_primitives::SensorKind;
use thiserror::Error;

use crate::asset::AssetStatus;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Coarse classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration source could not be read or parsed.
    Load,
    /// Shape or field constraint violation.
    Structural,
    /// Secret reference could not be resolved.
    SecretResolution,
    /// Asset file stayed unreachable.
    AssetValidation,
}

/// Errors that halt the configuration pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be loaded.
    #[error("failed to load configuration: {reason}")]
    Load {
        /// Human-readable reason.
        reason: String,
    },
    /// Structural validation failed.
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// A secret reference failed to resolve.
    #[error(transparent)]
    Secret(#[from] SecretResolutionError),
    /// An asset file could not be validated.
    #[error(transparent)]
    Asset(#[from] AssetValidationError),
}

impl ConfigError {
    /// Helper to construct load errors from string-like values.
    #[must_use]
    pub fn load(reason: impl Into<String>) -> Self {
        Self::Load {
            reason: reason.into(),
        }
    }

    /// Returns the taxonomy member of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Load { .. } => ErrorKind::Load,
            Self::Structural(_) => ErrorKind::Structural,
            Self::Secret(_) => ErrorKind::SecretResolution,
            Self::Asset(_) => ErrorKind::AssetValidation,
        }
    }
}

/// Missing, empty, or malformed fields. Never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructuralError {
    /// A required top-level field is absent or empty.
    #[error("{field} is required in configuration")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// The sensor list is absent or empty.
    #[error("at least one sensor is required")]
    NoSensors,
    /// A field had the wrong JSON shape.
    #[error("{field} must be {expected}")]
    InvalidShape {
        /// Dotted path of the offending field.
        field: String,
        /// Description of the expected shape.
        expected: &'static str,
    },
    /// A sensor declared a type outside the supported set.
    #[error("sensor #{index}: unknown sensor type `{tag}`")]
    UnknownSensorType {
        /// Position of the sensor in the input list.
        index: usize,
        /// The rejected discriminator.
        tag: String,
    },
    /// A sensor lacks the field its type requires.
    #[error("sensor #{index} ({kind}) is missing required field `{field}`")]
    MissingSensorField {
        /// Position of the sensor in the input list.
        index: usize,
        /// Declared sensor kind.
        kind: SensorKind,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A sensor field failed its typed constraint.
    #[error("sensor #{index} ({kind}): {reason}")]
    InvalidSensor {
        /// Position of the sensor in the input list.
        index: usize,
        /// Declared sensor kind.
        kind: SensorKind,
        /// Human-readable reason.
        reason: String,
    },
    /// The robot identifier was rejected.
    #[error(transparent)]
    RobotId(#[from] robot_primitives::Error),
}

/// Secret reference failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretResolutionError {
    /// The reference string does not follow `SECRET:<robot>:<sensor>[:<key>]`.
    #[error("malformed secret reference `{reference}`")]
    Malformed {
        /// The raw reference string.
        reference: String,
    },
    /// Neither the secret store nor the environment produced a value.
    #[error(
        "secret {secret_key} for sensor {sensor_name} of robot {robot_id} unresolved after {attempts} attempt(s)"
    )]
    Unresolved {
        /// Robot whose store was consulted.
        robot_id: String,
        /// Sensor section of the store.
        sensor_name: String,
        /// Key inside the sensor section.
        secret_key: String,
        /// Attempts made before giving up.
        attempts: u32,
    },
}

/// Asset reachability failure after exhausting retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("asset {} for sensor #{index} ({kind}) is {status} after {attempts} attempt(s)", .path.display())]
pub struct AssetValidationError {
    /// Position of the sensor in the input list.
    pub index: usize,
    /// Sensor kind referencing the asset.
    pub kind: SensorKind,
    /// Asset path as configured.
    pub path: PathBuf,
    /// Status observed on the final attempt.
    pub status: AssetStatus,
    /// Attempts made before giving up.
    pub attempts: u32,
}
