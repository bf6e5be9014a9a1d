//! Sensor kind discriminator.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Discrete sensor kinds supported by the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Ranged sensor with a bit-mask asset.
    SensorA,
    /// Motion sensor reporting speed.
    SensorB,
    /// Field sensor with a field-map asset.
    SensorC,
}

impl SensorKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 3] = [Self::SensorA, Self::SensorB, Self::SensorC];

    /// Returns the wire tag used in the `type` discriminator.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::SensorA => "sensor_a",
            Self::SensorB => "sensor_b",
            Self::SensorC => "sensor_c",
        }
    }

    /// Field that must be present for a sensor of this kind.
    #[must_use]
    pub const fn required_field(self) -> &'static str {
        match self {
            Self::SensorA => "bit_mask",
            Self::SensorB => "speed_km_per_h",
            Self::SensorC => "field_map",
        }
    }
}

impl Display for SensorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SensorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| Error::UnknownSensorKind(s.to_owned()))
    }
}
