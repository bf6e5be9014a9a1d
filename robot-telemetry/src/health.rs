//! Health reporting counters.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::error;

/// Counters shared between the kernel and observability collaborators.
///
/// Increments are lock-free; the error log is guarded by a mutex because it
/// is appended to rarely and read only by exporters.
#[derive(Debug, Default)]
pub struct RuntimeCounters {
    health_checks: AtomicU64,
    asset_retries: AtomicU64,
    errors: Mutex<Vec<String>>,
}

impl RuntimeCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one health probe and returns the new total.
    pub fn record_health_check(&self) -> u64 {
        self.health_checks.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Adds backoff sleeps spent waiting for assets.
    pub fn add_asset_retries(&self, retries: u64) {
        self.asset_retries.fetch_add(retries, Ordering::Relaxed);
    }

    /// Appends a runtime error to the log.
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        error!(error = %message, "runtime error recorded");
        self.errors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message);
    }

    /// Returns the number of health probes served.
    #[must_use]
    pub fn health_checks(&self) -> u64 {
        self.health_checks.load(Ordering::Relaxed)
    }

    /// Returns the total asset retry count.
    #[must_use]
    pub fn asset_retries(&self) -> u64 {
        self.asset_retries.load(Ordering::Relaxed)
    }

    /// Returns a point-in-time copy for exporters.
    #[must_use]
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            health_checks: self.health_checks(),
            asset_retries: self.asset_retries(),
            errors: self
                .errors
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Serializable view of [`RuntimeCounters`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    /// Health probes served.
    pub health_checks: u64,
    /// Backoff sleeps spent on assets during startup.
    pub asset_retries: u64,
    /// Runtime errors in arrival order.
    pub errors: Vec<String>,
}
