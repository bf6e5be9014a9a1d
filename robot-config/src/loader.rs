//! Configuration source loading.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::secrets::HostEnv;

/// Environment variable naming the configuration document.
pub const CONFIG_PATH_ENV: &str = "ROBOT_CONFIG";

/// Configuration document used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "/app/config.json";

/// Environment variable naming the mounted secret store directory.
pub const SECRETS_DIR_ENV: &str = "ROBOT_SECRETS_DIR";

/// Secret store directory used when [`SECRETS_DIR_ENV`] is unset.
pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets/robots";

/// Returns the configuration path selected by `env`.
#[must_use]
pub fn config_path(env: &dyn HostEnv) -> PathBuf {
    env.var(CONFIG_PATH_ENV)
        .filter(|path| !path.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Reads and parses the configuration document at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when the file is missing, unreadable, or not
/// valid JSON.
pub fn load_raw(path: &Path) -> ConfigResult<Value> {
    let data = std::fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => {
            ConfigError::load(format!("configuration file not found: {}", path.display()))
        }
        _ => ConfigError::load(format!(
            "cannot read configuration file {}: {err}",
            path.display()
        )),
    })?;

    let raw = serde_json::from_slice(&data)
        .map_err(|err| ConfigError::load(format!("invalid JSON in configuration file: {err}")))?;
    debug!(path = %path.display(), bytes = data.len(), "configuration loaded");
    Ok(raw)
}
