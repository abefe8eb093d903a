//! Secret name resolution.

use crate::error::{Result, SwarmJobError};
use crate::swarm::model::SECRET_FILE_MODE;
use crate::swarm::{Orchestrator, Secret, SecretFileTarget, SecretReference};
use tracing::debug;

/// Reference to a secret, mounted root-owned and world-readable.
pub fn secret_reference(name: &str, id: &str) -> SecretReference {
    SecretReference {
        file: SecretFileTarget {
            name: name.to_string(),
            uid: "0".to_string(),
            gid: "0".to_string(),
            mode: SECRET_FILE_MODE,
        },
        secret_id: id.to_string(),
        secret_name: name.to_string(),
    }
}

/// Resolve every requested name against the catalog.
///
/// The first catalog entry with an exactly matching name wins. Any name
/// without a match fails the whole resolution.
pub fn resolve(names: &[String], catalog: &[Secret]) -> Result<Vec<SecretReference>> {
    names
        .iter()
        .map(|name| {
            catalog
                .iter()
                .find(|s| s.name() == name)
                .map(|s| secret_reference(name, &s.id))
                .ok_or_else(|| SwarmJobError::SecretNotFound { name: name.clone() })
        })
        .collect()
}

/// Fetch the secret catalog and resolve `names`. No call is made when no
/// secrets were requested.
pub fn resolve_secrets(
    orchestrator: &dyn Orchestrator,
    names: &[String],
) -> Result<Vec<SecretReference>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let catalog = orchestrator
        .list_secrets()
        .map_err(|e| SwarmJobError::SecretLookup(e.to_string()))?;
    debug!(requested = names.len(), available = catalog.len(), "resolving secrets");

    resolve(names, &catalog)
}
