//! Orchestrates structural checks, secret resolution, and sensor validation.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use robot_primitives::{RobotId, SensorKind};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::asset::{AssetProbe, FsAssetChecker};
use crate::error::{ConfigResult, StructuralError};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::schema::RobotConfiguration;
use crate::secrets::{FileSecretStore, HostEnv, ProcessEnv, SecretResolver, SecretStore};
use crate::sensor::SensorValidator;
use crate::walker::ConfigTreeWalker;

/// Observability by-products of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// Backoff sleeps spent waiting for assets, across all sensors.
    pub asset_retries: u32,
    /// Non-fatal findings such as empty asset files.
    pub warnings: Vec<String>,
}

/// Output of [`ConfigValidationPipeline::validate_and_resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    /// The resolved configuration.
    pub configuration: RobotConfiguration,
    /// Retry and warning details gathered on the way.
    pub report: PipelineReport,
}

/// Turns a raw configuration document into a [`RobotConfiguration`].
#[derive(Clone)]
pub struct ConfigValidationPipeline {
    resolver: SecretResolver,
    validator: SensorValidator,
    secret_policy: RetryPolicy,
    asset_policy: RetryPolicy,
}

impl fmt::Debug for ConfigValidationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigValidationPipeline")
            .field("resolver", &self.resolver)
            .field("validator", &self.validator)
            .field("secret_policy", &self.secret_policy)
            .field("asset_policy", &self.asset_policy)
            .finish()
    }
}

impl ConfigValidationPipeline {
    /// Creates a pipeline from explicit collaborators and default policies.
    #[must_use]
    pub fn new(
        store: Arc<dyn SecretStore>,
        env: Arc<dyn HostEnv>,
        probe: Arc<dyn AssetProbe>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            resolver: SecretResolver::new(store, env, Arc::clone(&sleeper)),
            validator: SensorValidator::new(probe, sleeper),
            secret_policy: RetryPolicy::default(),
            asset_policy: RetryPolicy::default(),
        }
    }

    /// Creates a pipeline backed by the local filesystem, the process
    /// environment, and blocking sleeps.
    #[must_use]
    pub fn from_host(secrets_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(FileSecretStore::new(secrets_dir)),
            Arc::new(ProcessEnv),
            Arc::new(FsAssetChecker),
            Arc::new(ThreadSleeper),
        )
    }

    /// Sets the policy used for secret lookups.
    #[must_use]
    pub fn with_secret_policy(mut self, policy: RetryPolicy) -> Self {
        self.secret_policy = policy;
        self
    }

    /// Sets the policy used for asset checks.
    #[must_use]
    pub fn with_asset_policy(mut self, policy: RetryPolicy) -> Self {
        self.asset_policy = policy;
        self
    }

    /// Validates `raw` and resolves its secrets.
    ///
    /// Runs the structural check, then secret resolution, then per-sensor
    /// validation in input order, stopping at the first failure. Nothing is
    /// returned unless every step succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`](crate::ConfigError) encountered.
    pub fn validate_and_resolve(&self, raw: &Value) -> ConfigResult<Validated> {
        let structure = check_structure(raw)?;
        let robot_id = structure.robot_id;
        debug!(%robot_id, sensors = structure.sensors.len(), "configuration structure accepted");

        let walker = ConfigTreeWalker::new(&self.resolver, self.secret_policy);
        let resolved = structure
            .sensors
            .iter()
            .map(|sensor| walker.resolve_secrets(sensor, robot_id.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = PipelineReport::default();
        let mut sensors = Vec::with_capacity(resolved.len());
        for (index, sensor) in resolved.iter().enumerate() {
            let validated = self.validator.validate(index, sensor, self.asset_policy)?;
            report.asset_retries += validated.asset_retries;
            report.warnings.extend(validated.warning);
            sensors.push(validated.spec);
        }

        let configuration = RobotConfiguration::new(robot_id, structure.version, sensors);
        info!(
            robot_id = %configuration.robot_id(),
            version = configuration.version(),
            sensors = configuration.sensors().len(),
            asset_retries = report.asset_retries,
            "robot configuration validated"
        );

        Ok(Validated {
            configuration,
            report,
        })
    }
}

struct Structure<'a> {
    robot_id: RobotId,
    version: Option<String>,
    sensors: &'a [Value],
}

fn check_structure(raw: &Value) -> Result<Structure<'_>, StructuralError> {
    let root = raw
        .as_object()
        .ok_or_else(|| StructuralError::InvalidShape {
            field: "configuration".into(),
            expected: "a JSON object",
        })?;

    let robot_id = match root.get("robot_id") {
        None | Some(Value::Null) => return Err(StructuralError::MissingField { field: "robot_id" }),
        Some(Value::String(id)) if id.trim().is_empty() => {
            return Err(StructuralError::MissingField { field: "robot_id" });
        }
        Some(Value::String(id)) => RobotId::new(id.as_str())?,
        Some(_) => {
            return Err(StructuralError::InvalidShape {
                field: "robot_id".into(),
                expected: "a string",
            });
        }
    };

    let version = match root.get("version") {
        None | Some(Value::Null) => None,
        Some(Value::String(version)) => Some(version.clone()),
        Some(_) => {
            return Err(StructuralError::InvalidShape {
                field: "version".into(),
                expected: "a string",
            });
        }
    };

    let sensors = match root.get("sensors") {
        None | Some(Value::Null) => return Err(StructuralError::NoSensors),
        Some(Value::Array(sensors)) if sensors.is_empty() => return Err(StructuralError::NoSensors),
        Some(Value::Array(sensors)) => sensors.as_slice(),
        Some(_) => {
            return Err(StructuralError::InvalidShape {
                field: "sensors".into(),
                expected: "an array",
            });
        }
    };

    for (index, sensor) in sensors.iter().enumerate() {
        let tag = sensor
            .as_object()
            .and_then(|map| map.get("type"))
            .and_then(Value::as_str)
            .ok_or_else(|| StructuralError::InvalidShape {
                field: format!("sensors[{index}].type"),
                expected: "a sensor type string",
            })?;
        tag.parse::<SensorKind>()
            .map_err(|_| StructuralError::UnknownSensorType {
                index,
                tag: tag.to_owned(),
            })?;
    }

    Ok(Structure {
        robot_id,
        version,
        sensors,
    })
}
