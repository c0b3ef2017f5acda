// ABOUTME: Environment reference resolution for manifest `env` entries.
// ABOUTME: Names are looked up in the caller's environment before any side effect.

use super::ManifestError;
use std::collections::HashMap;

/// Resolve manifest env references against the process environment.
///
/// Every name must be present; a missing variable fails the attempt before
/// anything has touched the container runtime.
pub fn resolve_env_refs(refs: &[String]) -> Result<HashMap<String, String>, ManifestError> {
    refs.iter()
        .map(|name| match std::env::var(name) {
            Ok(value) => Ok((name.clone(), value)),
            Err(_) => Err(ManifestError::MissingEnvVar(name.clone())),
        })
        .collect()
}
