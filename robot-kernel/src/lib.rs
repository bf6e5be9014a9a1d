//! Robot lifecycle kernel.
//!
//! The kernel owns the startup state machine, installs the configuration
//! produced by the validation pipeline, and answers the read-only root,
//! health and status queries served once the robot is up.

#![warn(missing_docs, clippy::pedantic)]

mod lifecycle;
mod views;

use std::sync::Arc;

use robot_config::{ConfigError, ConfigValidationPipeline, RobotConfiguration};
use robot_telemetry::RuntimeCounters;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

pub use lifecycle::{LifecycleError, LifecycleEvent, LifecycleResult, RobotLifecycle, RobotState};
pub use views::{HealthView, RootView, SERVICE_MESSAGE, StatusView};

/// Errors surfaced by [`RobotKernel`].
#[derive(Debug, Error)]
pub enum KernelError {
    /// Query issued before a configuration was accepted.
    #[error("robot not initialized")]
    NotInitialized,
    /// Lifecycle rejected the requested transition.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// The validation pipeline rejected the configuration.
    #[error("failed to initialize robot: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias used by the kernel.
pub type KernelResult<T> = Result<T, KernelError>;

/// Core runtime that wires the lifecycle, configuration, and counters.
#[derive(Debug)]
pub struct RobotKernel {
    lifecycle: RobotLifecycle,
    configuration: Option<Arc<RobotConfiguration>>,
    counters: Arc<RuntimeCounters>,
}

impl RobotKernel {
    /// Creates a kernel in [`RobotState::Starting`].
    #[must_use]
    pub fn new(counters: Arc<RuntimeCounters>) -> Self {
        Self {
            lifecycle: RobotLifecycle::new(),
            configuration: None,
            counters,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RobotState {
        self.lifecycle.state()
    }

    /// Returns the installed configuration, if any.
    #[must_use]
    pub fn configuration(&self) -> Option<&Arc<RobotConfiguration>> {
        self.configuration.as_ref()
    }

    /// Returns the shared counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<RuntimeCounters> {
        &self.counters
    }

    /// Runs `pipeline` over `raw` and installs the result.
    ///
    /// On success the kernel moves to [`RobotState::Initialized`] and the
    /// pipeline's asset retry count is added to the counters. On failure it
    /// moves to [`RobotState::Failed`] and keeps no configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Lifecycle`] when called after a previous
    /// bootstrap, or [`KernelError::Config`] when validation fails.
    pub fn bootstrap(
        &mut self,
        pipeline: &ConfigValidationPipeline,
        raw: &Value,
    ) -> KernelResult<Arc<RobotConfiguration>> {
        let state = self.lifecycle.state();
        if state.is_terminal() {
            return Err(LifecycleError::InvalidTransition {
                from: state,
                event: LifecycleEvent::ConfigAccepted,
            }
            .into());
        }

        match pipeline.validate_and_resolve(raw) {
            Ok(validated) => {
                self.lifecycle.transition(LifecycleEvent::ConfigAccepted)?;
                self.counters
                    .add_asset_retries(u64::from(validated.report.asset_retries));
                let configuration = Arc::new(validated.configuration);
                info!(
                    robot_id = %configuration.robot_id(),
                    sensors = configuration.sensors().len(),
                    "robot initialized"
                );
                self.configuration = Some(Arc::clone(&configuration));
                Ok(configuration)
            }
            Err(err) => {
                self.lifecycle.transition(LifecycleEvent::ConfigRejected)?;
                error!(kind = ?err.kind(), error = %err, "failed to initialize robot");
                Err(err.into())
            }
        }
    }

    /// Builds the root view. Always available.
    #[must_use]
    pub fn root(&self) -> RootView {
        RootView {
            message: SERVICE_MESSAGE,
            robot_id: self
                .configuration
                .as_ref()
                .map_or_else(|| "unknown".to_owned(), |config| config.robot_id().to_string()),
            status: if self.state().is_initialized() {
                "running"
            } else {
                "initializing"
            },
        }
    }

    /// Answers a health probe. Every probe is counted.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::NotInitialized`] before a configuration has
    /// been accepted.
    pub fn health(&self) -> KernelResult<HealthView> {
        self.counters.record_health_check();
        let configuration = self.initialized()?;
        Ok(HealthView {
            status: "healthy",
            robot_id: configuration.robot_id().to_string(),
        })
    }

    /// Builds the status view.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::NotInitialized`] before a configuration has
    /// been accepted.
    pub fn status(&self) -> KernelResult<StatusView> {
        let configuration = self.initialized()?;
        Ok(StatusView {
            robot_id: configuration.robot_id().to_string(),
            version: configuration.version().to_owned(),
            sensors: configuration.summary(),
            initialized: true,
        })
    }

    /// Records an error raised while serving. Does not re-run validation.
    pub fn record_runtime_error(&self, message: impl Into<String>) {
        self.counters.record_error(message);
    }

    fn initialized(&self) -> KernelResult<&RobotConfiguration> {
        match (&self.configuration, self.state()) {
            (Some(configuration), RobotState::Initialized) => Ok(configuration),
            _ => Err(KernelError::NotInitialized),
        }
    }
}
