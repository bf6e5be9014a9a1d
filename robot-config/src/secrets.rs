//! Secret references and their resolution.
//!
//! A configuration string of the form `SECRET:<robot_id>:<sensor_name>[:<secret_key>]`
//! points into a per-robot secret store document shaped
//! `{sensor_name: {secret_key: value}}`. When the store has no entry, the value
//! is looked up in the environment variable
//! `SECRET_<ROBOT_ID>_<SENSOR_NAME>_<SECRET_KEY>`.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::SecretResolutionError;
use crate::retry::{RetryPolicy, Sleeper};

/// Prefix marking a string leaf as a secret reference.
pub const SECRET_PREFIX: &str = "SECRET:";

/// Key used when a reference omits its secret key.
pub const DEFAULT_SECRET_KEY: &str = "wgs84_coordinates";

/// Parsed `SECRET:` reference. Borrowed from the configuration leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretReference<'a> {
    robot_id: Option<&'a str>,
    sensor_name: Option<&'a str>,
    secret_key: &'a str,
}

impl<'a> SecretReference<'a> {
    /// Returns `true` if `raw` carries the secret prefix.
    #[must_use]
    pub fn is_reference(raw: &str) -> bool {
        raw.starts_with(SECRET_PREFIX)
    }

    /// Parses a reference string.
    ///
    /// The string is split on `:` into at most four parts so that secret keys
    /// may themselves contain colons. Empty robot or sensor parts are kept as
    /// `None` and filled from the enclosing context by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`SecretResolutionError::Malformed`] when the prefix is missing
    /// or fewer than three parts are present.
    pub fn parse(raw: &'a str) -> Result<Self, SecretResolutionError> {
        let malformed = || SecretResolutionError::Malformed {
            reference: raw.to_owned(),
        };

        if !Self::is_reference(raw) {
            return Err(malformed());
        }

        let parts: Vec<&str> = raw.splitn(4, ':').collect();
        if parts.len() < 3 {
            return Err(malformed());
        }

        let non_empty = |part: &'a str| (!part.is_empty()).then_some(part);
        Ok(Self {
            robot_id: non_empty(parts[1]),
            sensor_name: non_empty(parts[2]),
            secret_key: parts
                .get(3)
                .copied()
                .and_then(non_empty)
                .unwrap_or(DEFAULT_SECRET_KEY),
        })
    }

    /// Target robot, if the reference names one.
    #[must_use]
    pub const fn robot_id(&self) -> Option<&'a str> {
        self.robot_id
    }

    /// Target sensor section, if the reference names one.
    #[must_use]
    pub const fn sensor_name(&self) -> Option<&'a str> {
        self.sensor_name
    }

    /// Key inside the sensor section.
    #[must_use]
    pub const fn secret_key(&self) -> &'a str {
        self.secret_key
    }
}

/// Builds the fallback environment variable name for a secret.
#[must_use]
pub fn env_var_name(robot_id: &str, sensor_name: &str, secret_key: &str) -> String {
    format!(
        "SECRET_{}_{}_{}",
        robot_id.to_uppercase(),
        sensor_name.to_uppercase(),
        secret_key.to_uppercase()
    )
}

/// Errors raised while reading a secret store document.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// The document exists but could not be read.
    #[error("failed to read secret store {path}: {source}")]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON.
    #[error("secret store {path} is not valid JSON: {source}")]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Source of per-robot secret documents.
pub trait SecretStore: Send + Sync {
    /// Loads the document for `robot_id`, or `None` when the robot has none.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when a document exists but cannot be used.
    fn load(&self, robot_id: &str) -> Result<Option<Value>, SecretStoreError>;
}

/// Secret store reading `<root>/<robot_id>.json` from a read-only mount.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    /// Creates a store rooted at the mounted secrets directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the document path for a robot.
    #[must_use]
    pub fn document_path(&self, robot_id: &str) -> PathBuf {
        self.root.join(format!("{robot_id}.json"))
    }
}

impl SecretStore for FileSecretStore {
    fn load(&self, robot_id: &str) -> Result<Option<Value>, SecretStoreError> {
        let path = self.document_path(robot_id);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SecretStoreError::Io { path, source }),
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|source| SecretStoreError::Parse { path, source })
    }
}

/// Access to environment-style variables.
pub trait HostEnv: Send + Sync {
    /// Returns the variable's value, if set and valid UTF-8.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl HostEnv for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed set of variables, for embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: BTreeMap<String, String>,
}

impl StaticEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl HostEnv for StaticEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Resolves secrets from the store, falling back to the environment.
#[derive(Clone)]
pub struct SecretResolver {
    store: Arc<dyn SecretStore>,
    env: Arc<dyn HostEnv>,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResolver")
            .field("store", &"dyn SecretStore")
            .field("env", &"dyn HostEnv")
            .field("sleeper", &"dyn Sleeper")
            .finish()
    }
}

impl SecretResolver {
    /// Creates a resolver from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn SecretStore>,
        env: Arc<dyn HostEnv>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            store,
            env,
            sleeper,
        }
    }

    /// Resolves one secret under the supplied retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SecretResolutionError::Unresolved`] when neither source
    /// produced a value on any attempt.
    pub fn resolve(
        &self,
        robot_id: &str,
        sensor_name: &str,
        secret_key: &str,
        policy: RetryPolicy,
    ) -> Result<Value, SecretResolutionError> {
        policy
            .run(self.sleeper.as_ref(), |_| {
                self.lookup(robot_id, sensor_name, secret_key).ok_or(())
            })
            .map(|retried| {
                debug!(
                    robot_id,
                    sensor_name,
                    secret_key,
                    attempts = retried.attempts,
                    "secret resolved"
                );
                retried.value
            })
            .map_err(|exhausted| {
                warn!(
                    robot_id,
                    sensor_name,
                    secret_key,
                    attempts = exhausted.attempts,
                    "secret unresolved"
                );
                SecretResolutionError::Unresolved {
                    robot_id: robot_id.to_owned(),
                    sensor_name: sensor_name.to_owned(),
                    secret_key: secret_key.to_owned(),
                    attempts: exhausted.attempts,
                }
            })
    }

    fn lookup(&self, robot_id: &str, sensor_name: &str, secret_key: &str) -> Option<Value> {
        match self.store.load(robot_id) {
            Ok(Some(document)) => {
                if let Some(value) = document
                    .get(sensor_name)
                    .and_then(|section| section.get(secret_key))
                {
                    return Some(value.clone());
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, robot_id, "secret store unavailable; trying environment"),
        }

        let raw = self.env.var(&env_var_name(robot_id, sensor_name, secret_key))?;
        Some(serde_json::from_str(&raw).unwrap_or_else(|_| Value::String(raw)))
    }
}
