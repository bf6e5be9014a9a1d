//! Structured tracing helpers.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed or the filter was invalid.
    #[error("failed to initialise tracing: {reason}")]
    Init {
        /// Human-readable reason.
        reason: String,
    },
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or `default_filter`
/// when the variable is unset.
///
/// # Errors
///
/// Returns [`TelemetryError::Init`] when `default_filter` does not parse or a
/// global subscriber is already set.
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|err| TelemetryError::Init {
            reason: err.to_string(),
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| TelemetryError::Init {
            reason: err.to_string(),
        })
}
