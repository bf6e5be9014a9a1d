//! Per-sensor-type validation, including asset reachability.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use robot_primitives::SensorKind;
use serde_json::Value;
use tracing::{debug, warn};

use crate::asset::{AssetProbe, AssetStatus};
use crate::error::{AssetValidationError, ConfigResult, StructuralError};
use crate::retry::{RetryPolicy, Sleeper};
use crate::schema::SensorSpec;

/// Sensor that passed field and asset validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSensor {
    /// Typed sensor.
    pub spec: SensorSpec,
    /// Backoff sleeps spent waiting for the asset.
    pub asset_retries: u32,
    /// Set when the asset exists but is empty.
    pub warning: Option<String>,
}

/// Validates resolved sensor mappings.
#[derive(Clone)]
pub struct SensorValidator {
    probe: Arc<dyn AssetProbe>,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for SensorValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorValidator")
            .field("probe", &"dyn AssetProbe")
            .field("sleeper", &"dyn Sleeper")
            .finish()
    }
}

impl SensorValidator {
    /// Creates a validator using `probe` for asset checks.
    #[must_use]
    pub fn new(probe: Arc<dyn AssetProbe>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { probe, sleeper }
    }

    /// Validates the sensor at position `index`.
    ///
    /// Field checks run first and are never retried; only asset reachability
    /// is retried under `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError`] for shape, type, missing-field and
    /// constraint failures, and [`AssetValidationError`] once the asset stays
    /// unusable for every attempt.
    pub fn validate(
        &self,
        index: usize,
        sensor: &Value,
        policy: RetryPolicy,
    ) -> ConfigResult<ValidatedSensor> {
        let map = sensor
            .as_object()
            .ok_or_else(|| StructuralError::InvalidShape {
                field: format!("sensors[{index}]"),
                expected: "an object",
            })?;

        let tag = map.get("type").and_then(Value::as_str).ok_or_else(|| {
            StructuralError::InvalidShape {
                field: format!("sensors[{index}].type"),
                expected: "a sensor type string",
            }
        })?;
        let kind: SensorKind = tag
            .parse()
            .map_err(|_| StructuralError::UnknownSensorType {
                index,
                tag: tag.to_owned(),
            })?;

        let field = kind.required_field();
        if is_blank(map.get(field)) {
            return Err(StructuralError::MissingSensorField { index, kind, field }.into());
        }

        let invalid = |reason: String| StructuralError::InvalidSensor {
            index,
            kind,
            reason,
        };
        let spec: SensorSpec =
            serde_json::from_value(sensor.clone()).map_err(|err| invalid(err.to_string()))?;
        spec.check_constraints().map_err(invalid)?;

        let Some(path) = spec.asset_path().map(Path::to_path_buf) else {
            debug!(index, %kind, "sensor validated");
            return Ok(ValidatedSensor {
                spec,
                asset_retries: 0,
                warning: None,
            });
        };

        let checked = policy
            .run(self.sleeper.as_ref(), |attempt| {
                let status = self.probe.check(&path);
                if status.is_usable() {
                    Ok(status)
                } else {
                    warn!(
                        index,
                        %kind,
                        path = %path.display(),
                        %status,
                        attempt = attempt + 1,
                        "asset check failed"
                    );
                    Err(status)
                }
            })
            .map_err(|exhausted| AssetValidationError {
                index,
                kind,
                path: path.clone(),
                status: exhausted.last,
                attempts: exhausted.attempts,
            })?;

        let warning = (checked.value == AssetStatus::EmptyWarning).then(|| {
            warn!(index, %kind, path = %path.display(), "asset file is empty");
            format!("sensor #{index} ({kind}): asset {} is empty", path.display())
        });
        debug!(index, %kind, attempts = checked.attempts, "sensor validated");

        let asset_retries = checked.retries();
        Ok(ValidatedSensor {
            spec,
            asset_retries,
            warning,
        })
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}
