//! Orchestrator collaborator for swarmjob.
//!
//! The lifecycle only talks to the orchestrator through the [`Orchestrator`]
//! trait. [`DockerClient`] implements it against the Docker Engine HTTP API;
//! tests use a recording fake.

pub mod client;
pub mod model;

pub use client::DockerClient;
pub use model::{
    ContainerSpec, ContainerStatus, CreateOptions, LogOptions, Mount, NetworkAttachmentConfig,
    Placement, RestartCondition, RestartPolicy, Secret, SecretFileTarget, SecretReference,
    ServerVersion, Service, ServiceCreateResponse, ServiceSpec, Task, TaskSpec, TaskState,
    TaskStatus,
};

use crate::error::Result;
use std::io::Read;

/// A readable stream of service log bytes.
pub type LogStream = Box<dyn Read + Send>;

/// The orchestrator operations swarmjob needs.
///
/// All calls are blocking. Implementations report failures as
/// `SwarmJobError::Connectivity` when the daemon cannot be reached and
/// `SwarmJobError::Api` when it answers with an error.
pub trait Orchestrator {
    /// Daemon API version and experimental flag.
    fn server_version(&self) -> Result<ServerVersion>;

    /// All secrets known to the swarm (names and IDs only).
    fn list_secrets(&self) -> Result<Vec<Secret>>;

    /// Create a service and return its ID plus any daemon warnings.
    fn create_service(
        &self,
        spec: &ServiceSpec,
        options: &CreateOptions,
    ) -> Result<ServiceCreateResponse>;

    /// Inspect a service by ID or name, with defaults filled in.
    fn inspect_service(&self, id: &str) -> Result<Service>;

    /// Services matching the given ID.
    fn list_services(&self, id: &str) -> Result<Vec<Service>>;

    /// Tasks belonging to the given service.
    fn list_tasks(&self, service_id: &str) -> Result<Vec<Task>>;

    /// Combined stdout/stderr log stream of a service.
    fn service_logs(&self, service_id: &str, options: &LogOptions) -> Result<LogStream>;

    /// Remove a service.
    fn remove_service(&self, id: &str) -> Result<()>;
}
