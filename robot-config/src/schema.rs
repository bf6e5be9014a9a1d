//! Strongly typed, validated configuration.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::path::Path;

use robot_primitives::{RobotId, SensorKind};
use serde::{Deserialize, Serialize};

/// Version reported when the configuration does not declare one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// WGS84 coordinate components keyed by name (`lat`, `lon`, ...).
pub type Coordinates = BTreeMap<String, f64>;

/// One sensor entry, discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorSpec {
    /// Ranged sensor with a bit-mask asset.
    SensorA {
        /// Detection range; strictly positive.
        range: f64,
        /// Mounting position.
        #[serde(rename = "wgs84_coordinates")]
        coordinates: Coordinates,
        /// Path of the bit-mask asset file.
        #[serde(rename = "bit_mask")]
        bit_mask_path: String,
    },
    /// Motion sensor.
    SensorB {
        /// Mounting position.
        #[serde(rename = "wgs84_coordinates")]
        coordinates: Coordinates,
        /// Speed in km/h; non-negative.
        #[serde(rename = "speed_km_per_h")]
        speed_kmh: f64,
    },
    /// Field sensor with a field-map asset.
    SensorC {
        /// Path of the field-map asset file.
        #[serde(rename = "field_map")]
        field_map_path: String,
        /// Battery level in percent, within `[0, 100]`.
        battery_pct: f64,
    },
}

impl SensorSpec {
    /// Returns the sensor's kind.
    #[must_use]
    pub const fn kind(&self) -> SensorKind {
        match self {
            Self::SensorA { .. } => SensorKind::SensorA,
            Self::SensorB { .. } => SensorKind::SensorB,
            Self::SensorC { .. } => SensorKind::SensorC,
        }
    }

    /// Returns the asset file this sensor depends on, if any.
    #[must_use]
    pub fn asset_path(&self) -> Option<&Path> {
        match self {
            Self::SensorA { bit_mask_path, .. } => Some(Path::new(bit_mask_path)),
            Self::SensorB { .. } => None,
            Self::SensorC { field_map_path, .. } => Some(Path::new(field_map_path)),
        }
    }

    /// Checks the numeric constraints of the variant.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason for the first violated constraint.
    pub fn check_constraints(&self) -> Result<(), String> {
        match self {
            Self::SensorA { range, .. } if !(range.is_finite() && *range > 0.0) => {
                Err(format!("range must be greater than 0, got {range}"))
            }
            Self::SensorB { speed_kmh, .. } if !(speed_kmh.is_finite() && *speed_kmh >= 0.0) => {
                Err(format!("speed_km_per_h must be at least 0, got {speed_kmh}"))
            }
            Self::SensorC { battery_pct, .. } if !(0.0..=100.0).contains(battery_pct) => {
                Err(format!("battery_pct must be within [0, 100], got {battery_pct}"))
            }
            _ => Ok(()),
        }
    }
}

struct CoordinatesDisplay<'a>(&'a Coordinates);

impl Display for CoordinatesDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (axis, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{axis}={value}")?;
        }
        f.write_str(")")
    }
}

/// One-line descriptor used by logging and status collaborators.
impl Display for SensorSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorA {
                range,
                coordinates,
                bit_mask_path,
            } => write!(
                f,
                "sensor_a at {} range {range} bit mask {bit_mask_path}",
                CoordinatesDisplay(coordinates)
            ),
            Self::SensorB {
                coordinates,
                speed_kmh,
            } => write!(
                f,
                "sensor_b at {} speed {speed_kmh} km/h",
                CoordinatesDisplay(coordinates)
            ),
            Self::SensorC {
                field_map_path,
                battery_pct,
            } => write!(f, "sensor_c field map {field_map_path} battery {battery_pct}%"),
        }
    }
}

/// Fully validated, secret-substituted robot configuration.
///
/// Only the pipeline constructs values of this type; there are no mutating
/// accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotConfiguration {
    robot_id: RobotId,
    version: String,
    sensors: Vec<SensorSpec>,
}

impl RobotConfiguration {
    pub(crate) fn new(
        robot_id: RobotId,
        version: Option<String>,
        sensors: Vec<SensorSpec>,
    ) -> Self {
        debug_assert!(!sensors.is_empty(), "validated configuration has sensors");
        Self {
            robot_id,
            version: version.unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
            sensors,
        }
    }

    /// Returns the robot identifier.
    #[must_use]
    pub fn robot_id(&self) -> &RobotId {
        &self.robot_id
    }

    /// Returns the declared or default version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the sensors in input order.
    #[must_use]
    pub fn sensors(&self) -> &[SensorSpec] {
        &self.sensors
    }

    /// Returns one descriptor line per sensor.
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        self.sensors.iter().map(ToString::to_string).collect()
    }
}
