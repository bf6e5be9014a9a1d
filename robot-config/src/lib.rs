//! Startup configuration pipeline for fleet robots.
//!
//! A raw JSON document goes through three stages before the robot is marked
//! operational:
//!
//! 1. structural checks on `robot_id`, `sensors`, and each sensor's `type`;
//! 2. substitution of `SECRET:` references from the mounted secret store or
//!    the environment ([`ConfigTreeWalker`], [`SecretResolver`]);
//! 3. per-sensor field and asset validation ([`SensorValidator`]).
//!
//! [`ConfigValidationPipeline`] sequences the stages and yields an immutable
//! [`RobotConfiguration`] or the first [`ConfigError`].

#![warn(missing_docs, clippy::pedantic)]

pub mod asset;
mod error;
pub mod loader;
mod pipeline;
pub mod retry;
pub mod schema;
pub mod secrets;
mod sensor;
pub mod walker;

pub use asset::{AssetProbe, AssetStatus, FsAssetChecker};
pub use error::{
    AssetValidationError, ConfigError, ConfigResult, ErrorKind, SecretResolutionError,
    StructuralError,
};
pub use pipeline::{ConfigValidationPipeline, PipelineReport, Validated};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use schema::{RobotConfiguration, SensorSpec};
pub use secrets::{
    FileSecretStore, HostEnv, ProcessEnv, SecretReference, SecretResolver, SecretStore, StaticEnv,
};
pub use sensor::{SensorValidator, ValidatedSensor};
pub use walker::ConfigTreeWalker;
