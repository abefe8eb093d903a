//! Service removal after a run.

use crate::error::{Result, SwarmJobError};
use crate::swarm::Orchestrator;
use tracing::info;

/// Remove the service. Callers report a failure but keep the task's outcome.
pub fn remove_service(orchestrator: &dyn Orchestrator, service_id: &str) -> Result<()> {
    orchestrator
        .remove_service(service_id)
        .map_err(|e| SwarmJobError::Cleanup {
            service_id: service_id.to_string(),
            reason: e.to_string(),
        })?;
    info!(%service_id, "service removed");
    Ok(())
}
