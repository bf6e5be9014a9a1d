//! Robot identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_ID_LEN: usize = 128;

/// Unique identifier for a robot in the fleet.
///
/// The identifier is used to derive the secret store path and the secret
/// environment variable names, so it may not contain path separators, the
/// `:` reference delimiter, or whitespace.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RobotId(String);

impl RobotId {
    /// Creates a robot identifier after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRobotId`] if the identifier is empty, too long,
    /// or contains unsupported characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_identifier(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidRobotId {
            id: id.into(),
            reason: "identifier cannot be empty".into(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(Error::InvalidRobotId {
            id: id.into(),
            reason: format!("identifier length must be <= {MAX_ID_LEN}"),
        });
    }

    if id
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ':' | '/' | '\\'))
    {
        return Err(Error::InvalidRobotId {
            id: id.into(),
            reason: "identifier cannot contain whitespace, `:`, or path separators".into(),
        });
    }

    Ok(())
}

impl Display for RobotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RobotId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for RobotId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RobotId> for String {
    fn from(value: RobotId) -> Self {
        value.0
    }
}

impl AsRef<str> for RobotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
