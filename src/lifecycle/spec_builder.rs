//! Service spec construction.
//!
//! Turns a prepared request (plus an optional base-service task template) into
//! the spec handed to the orchestrator. Building cannot fail: everything that
//! could be invalid was rejected while preparing the request.

use crate::error::{Result, SwarmJobError};
use crate::swarm::{
    ContainerSpec, Mount, NetworkAttachmentConfig, Placement, RestartPolicy, SecretReference,
    ServiceSpec, TaskSpec,
};
use crate::task::PreparedRequest;
use std::collections::BTreeMap;

const MOUNT_USAGE: &str =
    "Bind-mounts must be specified as: src=dest, i.e. --mount /home/alex/tmp/=/tmp/";

/// Parse one `source=target` bind mount.
pub fn parse_mount(value: &str) -> Result<Mount> {
    let parts: Vec<&str> = value.split('=').collect();
    match parts.as_slice() {
        [source, target] if !source.is_empty() && !target.is_empty() => {
            Ok(Mount::bind(*source, *target))
        }
        _ => Err(SwarmJobError::Validation(format!(
            "invalid mount '{}'. {}",
            value, MOUNT_USAGE
        ))),
    }
}

pub fn parse_mounts(values: &[String]) -> Result<Vec<Mount>> {
    values.iter().map(|v| parse_mount(v)).collect()
}

/// Build the one-shot service spec.
///
/// Fields left empty in the request keep whatever the template had. The
/// restart policy is always replaced so the task never runs twice.
pub fn build_spec(
    prepared: &PreparedRequest,
    template: Option<TaskSpec>,
    labels: BTreeMap<String, String>,
) -> ServiceSpec {
    let request = &prepared.request;

    let mut task_template = template.unwrap_or_default();
    task_template.restart_policy = Some(RestartPolicy::one_shot());

    let container = task_template
        .container_spec
        .get_or_insert_with(ContainerSpec::default);

    if !request.image.is_empty() {
        container.image = request.image.clone();
    }
    if !request.env_vars.is_empty() {
        container.env = request.env_vars.clone();
    }
    container.env.extend(prepared.file_env.iter().cloned());
    if !prepared.command.is_empty() {
        container.command = prepared.command.clone();
    }
    if !prepared.mounts.is_empty() {
        container.mounts = prepared.mounts.clone();
    }

    if !request.constraints.is_empty() {
        task_template
            .placement
            .get_or_insert_with(Placement::default)
            .constraints = request.constraints.clone();
    }

    let networks = request
        .networks
        .first()
        .map(|target| {
            vec![NetworkAttachmentConfig {
                target: target.clone(),
            }]
        })
        .unwrap_or_default();

    ServiceSpec {
        labels,
        task_template,
        networks,
        ..Default::default()
    }
}

/// Attach resolved secrets, replacing any the template carried.
pub fn attach_secrets(spec: &mut ServiceSpec, secrets: Vec<SecretReference>) {
    if secrets.is_empty() {
        return;
    }
    spec.task_template
        .container_spec
        .get_or_insert_with(ContainerSpec::default)
        .secrets = secrets;
}

/// Whether the spec's container allocates a TTY. The Engine omits `TTY`
/// when it is false, so an unset field means a multiplexed log stream.
pub fn container_tty(spec: &ServiceSpec) -> bool {
    spec.task_template
        .container_spec
        .as_ref()
        .and_then(|c| c.tty)
        .unwrap_or(false)
}
