//! Serializable views served to health and status collaborators.

use serde::Serialize;

/// Banner returned by the root endpoint.
pub const SERVICE_MESSAGE: &str = "Robot Fleet Management System";

/// Response for the root endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootView {
    /// Service banner.
    pub message: &'static str,
    /// Configured robot, or `unknown` before initialization.
    pub robot_id: String,
    /// `running` once initialized, otherwise `initializing`.
    pub status: &'static str,
}

/// Response for a successful health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthView {
    /// Always `healthy`.
    pub status: &'static str,
    /// Configured robot.
    pub robot_id: String,
}

/// Response for the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    /// Configured robot.
    pub robot_id: String,
    /// Configuration version.
    pub version: String,
    /// One descriptor line per sensor.
    pub sensors: Vec<String>,
    /// Whether the robot finished initialization.
    pub initialized: bool,
}
