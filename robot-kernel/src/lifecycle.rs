//! Lifecycle state machine for robot startup.

use thiserror::Error;
use tracing::debug;

/// States a robot occupies between process start and readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotState {
    /// Configuration has not been validated yet.
    Starting,
    /// A validated configuration is installed and the robot is serving.
    Initialized,
    /// Validation failed; the robot never becomes ready.
    Failed,
}

impl RobotState {
    /// Returns `true` once a configuration has been accepted.
    #[must_use]
    pub const fn is_initialized(self) -> bool {
        matches!(self, Self::Initialized)
    }

    /// Returns `true` for states that accept no further events.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Initialized | Self::Failed)
    }
}

/// Events that trigger lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The validation pipeline produced a configuration.
    ConfigAccepted,
    /// The validation pipeline rejected the configuration.
    ConfigRejected,
}

/// Lifecycle state manager.
#[derive(Debug, Clone, Copy)]
pub struct RobotLifecycle {
    state: RobotState,
}

impl Default for RobotLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotLifecycle {
    /// Constructs a lifecycle in [`RobotState::Starting`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: RobotState::Starting,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> RobotState {
        self.state
    }

    /// Applies a lifecycle event, returning the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] when the event is not
    /// allowed from the current state.
    pub fn transition(&mut self, event: LifecycleEvent) -> LifecycleResult<RobotState> {
        let next_state = match (self.state, event) {
            (RobotState::Starting, LifecycleEvent::ConfigAccepted) => RobotState::Initialized,
            (RobotState::Starting, LifecycleEvent::ConfigRejected) => RobotState::Failed,
            _ => {
                return Err(LifecycleError::InvalidTransition {
                    from: self.state,
                    event,
                });
            }
        };

        debug!(from = ?self.state, ?next_state, ?event, "robot lifecycle transition");
        self.state = next_state;
        Ok(self.state)
    }
}

/// Errors emitted by the lifecycle controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Transition was not permitted from the current state.
    #[error("invalid lifecycle transition from {from:?} via {event:?}")]
    InvalidTransition {
        /// State prior to the attempted transition.
        from: RobotState,
        /// Event that triggered the failure.
        event: LifecycleEvent,
    },
}

/// Result alias used for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
