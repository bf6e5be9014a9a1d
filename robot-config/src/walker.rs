//! Recursive secret substitution over the configuration tree.

use robot_primitives::RobotId;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::SecretResolutionError;
use crate::retry::RetryPolicy;
use crate::secrets::{SecretReference, SecretResolver};

/// Rebuilds `value`, letting `rewrite` replace string leaves.
///
/// `enter` derives the context for the children of every mapping from the
/// context of its parent; `rewrite` returns `Some` to replace a leaf and `None`
/// to keep it. The input is never modified.
///
/// # Errors
///
/// Stops at the first error returned by `rewrite`.
pub fn transform_strings<'v, C, E>(
    value: &'v Value,
    context: &C,
    enter: impl Fn(&C, &'v Map<String, Value>) -> C,
    mut rewrite: impl FnMut(&str, &C) -> Result<Option<Value>, E>,
) -> Result<Value, E> {
    walk(value, context, &enter, &mut rewrite)
}

fn walk<'v, C, E, F, R>(
    value: &'v Value,
    context: &C,
    enter: &F,
    rewrite: &mut R,
) -> Result<Value, E>
where
    F: Fn(&C, &'v Map<String, Value>) -> C,
    R: FnMut(&str, &C) -> Result<Option<Value>, E>,
{
    match value {
        Value::String(leaf) => Ok(rewrite(leaf, context)?.unwrap_or_else(|| value.clone())),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(walk(item, context, enter, rewrite)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let inner = enter(context, map);
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                out.insert(key.clone(), walk(child, &inner, enter, rewrite)?);
            }
            Ok(Value::Object(out))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
    }
}

fn enclosing_sensor<'v>(
    current: &Option<&'v str>,
    map: &'v Map<String, Value>,
) -> Option<&'v str> {
    current.or_else(|| map.get("type").and_then(Value::as_str))
}

/// Replaces every `SECRET:` leaf with the value produced by a [`SecretResolver`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigTreeWalker<'r> {
    resolver: &'r SecretResolver,
    policy: RetryPolicy,
}

impl<'r> ConfigTreeWalker<'r> {
    /// Creates a walker resolving under `policy`.
    #[must_use]
    pub const fn new(resolver: &'r SecretResolver, policy: RetryPolicy) -> Self {
        Self { resolver, policy }
    }

    /// Returns a copy of `tree` with every secret reference resolved.
    ///
    /// The `type` of the outermost enclosing mapping that has one, which is
    /// the sensor entry, is used as the sensor name when a reference leaves it
    /// empty. Nested mappings carrying their own `type` do not change it. An
    /// empty robot part falls back to `robot_id`.
    ///
    /// # Errors
    ///
    /// Malformed references, including ones naming an invalid robot id, fail
    /// immediately; unresolvable ones fail after the policy's attempts are
    /// spent.
    pub fn resolve_secrets(
        &self,
        tree: &Value,
        robot_id: &str,
    ) -> Result<Value, SecretResolutionError> {
        let mut resolved = 0_usize;
        let out = transform_strings(
            tree,
            &None,
            enclosing_sensor,
            |leaf, sensor| -> Result<Option<Value>, SecretResolutionError> {
                if !SecretReference::is_reference(leaf) {
                    return Ok(None);
                }

                let reference = SecretReference::parse(leaf)?;
                let sensor_name = reference.sensor_name().or(*sensor).ok_or_else(|| {
                    SecretResolutionError::Malformed {
                        reference: leaf.to_owned(),
                    }
                })?;
                let target = reference.robot_id().unwrap_or(robot_id);
                if let Err(err) = RobotId::new(target) {
                    warn!(reference = leaf, %err, "secret reference names an invalid robot id");
                    return Err(SecretResolutionError::Malformed {
                        reference: leaf.to_owned(),
                    });
                }
                let value = self.resolver.resolve(
                    target,
                    sensor_name,
                    reference.secret_key(),
                    self.policy,
                )?;
                resolved += 1;
                Ok(Some(value))
            },
        )?;

        if resolved > 0 {
            debug!(robot_id, resolved, "secret references substituted");
        }
        Ok(out)
    }
}
