use crate::error::{Result, SwarmJobError};
use crate::swarm::{
    ContainerStatus, CreateOptions, LogOptions, LogStream, Orchestrator, Secret, ServerVersion,
    Service, ServiceCreateResponse, ServiceSpec, Task, TaskSpec, TaskState, TaskStatus,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::Cursor;

/// Service ID handed out by [`FakeOrchestrator::create_service`].
pub(crate) const CREATED_SERVICE_ID: &str = "svc-created";

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ServerVersion,
    ListSecrets,
    CreateService,
    InspectService(String),
    ListServices(String),
    ListTasks(String),
    ServiceLogs(String),
    RemoveService(String),
}

/// In-memory orchestrator that records every call.
///
/// Task listings are scripted: each call pops the next listing and the last
/// one repeats forever.
pub(crate) struct FakeOrchestrator {
    version: ServerVersion,
    secrets: Vec<Secret>,
    templates: Vec<Service>,
    existing_service: Option<String>,
    task_script: RefCell<VecDeque<Vec<Task>>>,
    task_list_failures: Cell<u32>,
    logs: Vec<u8>,
    fail_version: bool,
    fail_create: bool,
    fail_logs: bool,
    fail_remove: bool,
    calls: RefCell<Vec<Call>>,
    created: RefCell<Vec<(ServiceSpec, CreateOptions)>>,
}

impl FakeOrchestrator {
    pub(crate) fn new() -> Self {
        Self {
            version: ServerVersion {
                api_version: "1.41".to_string(),
                version: "20.10.24".to_string(),
                experimental: false,
            },
            secrets: Vec::new(),
            templates: Vec::new(),
            existing_service: None,
            task_script: RefCell::new(VecDeque::new()),
            task_list_failures: Cell::new(0),
            logs: Vec::new(),
            fail_version: false,
            fail_create: false,
            fail_logs: false,
            fail_remove: false,
            calls: RefCell::new(Vec::new()),
            created: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_api_version(mut self, api_version: &str, experimental: bool) -> Self {
        self.version.api_version = api_version.to_string();
        self.version.experimental = experimental;
        self
    }

    pub(crate) fn with_secret(mut self, name: &str, id: &str) -> Self {
        self.secrets.push(Secret::new(name, id));
        self
    }

    /// A service that can be used as a `--base` template.
    pub(crate) fn with_template(mut self, name: &str, template: TaskSpec) -> Self {
        self.templates.push(Service {
            id: format!("base-{}", name),
            spec: ServiceSpec {
                name: name.to_string(),
                task_template: template,
                ..Default::default()
            },
            ..Default::default()
        });
        self
    }

    /// Make `id` visible to service listings without creating it.
    pub(crate) fn with_existing_service(mut self, id: &str) -> Self {
        self.existing_service = Some(id.to_string());
        self
    }

    pub(crate) fn with_tasks(self, script: Vec<Vec<Task>>) -> Self {
        *self.task_script.borrow_mut() = script.into();
        self
    }

    /// Fail the next `n` task listings.
    pub(crate) fn with_task_list_failures(self, n: u32) -> Self {
        self.task_list_failures.set(n);
        self
    }

    pub(crate) fn with_logs(mut self, bytes: Vec<u8>) -> Self {
        self.logs = bytes;
        self
    }

    pub(crate) fn failing_version(mut self) -> Self {
        self.fail_version = true;
        self
    }

    pub(crate) fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub(crate) fn failing_logs(mut self) -> Self {
        self.fail_logs = true;
        self
    }

    pub(crate) fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Specs and options passed to `create_service`, in call order.
    pub(crate) fn created(&self) -> Vec<(ServiceSpec, CreateOptions)> {
        self.created.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn not_found(what: &str, id: &str) -> SwarmJobError {
        SwarmJobError::Api {
            status: Some(404),
            message: format!("{} {} not found", what, id),
        }
    }
}

impl Orchestrator for FakeOrchestrator {
    fn server_version(&self) -> Result<ServerVersion> {
        self.record(Call::ServerVersion);
        if self.fail_version {
            return Err(SwarmJobError::Connectivity(
                "connection refused".to_string(),
            ));
        }
        Ok(self.version.clone())
    }

    fn list_secrets(&self) -> Result<Vec<Secret>> {
        self.record(Call::ListSecrets);
        Ok(self.secrets.clone())
    }

    fn create_service(
        &self,
        spec: &ServiceSpec,
        options: &CreateOptions,
    ) -> Result<ServiceCreateResponse> {
        self.record(Call::CreateService);
        if self.fail_create {
            return Err(SwarmJobError::Submission(
                "rpc error: invalid mount config".to_string(),
            ));
        }
        self.created
            .borrow_mut()
            .push((spec.clone(), options.clone()));
        Ok(ServiceCreateResponse {
            id: CREATED_SERVICE_ID.to_string(),
            warnings: None,
        })
    }

    fn inspect_service(&self, id: &str) -> Result<Service> {
        self.record(Call::InspectService(id.to_string()));
        if id == CREATED_SERVICE_ID
            && let Some((spec, _)) = self.created.borrow().last()
        {
            return Ok(Service {
                id: id.to_string(),
                spec: spec.clone(),
                ..Default::default()
            });
        }
        self.templates
            .iter()
            .find(|s| s.id == id || s.spec.name == id)
            .cloned()
            .ok_or_else(|| Self::not_found("service", id))
    }

    fn list_services(&self, id: &str) -> Result<Vec<Service>> {
        self.record(Call::ListServices(id.to_string()));
        let exists = self.existing_service.as_deref() == Some(id)
            || (id == CREATED_SERVICE_ID && !self.created.borrow().is_empty());
        if !exists {
            return Ok(Vec::new());
        }
        Ok(vec![Service {
            id: id.to_string(),
            ..Default::default()
        }])
    }

    fn list_tasks(&self, service_id: &str) -> Result<Vec<Task>> {
        self.record(Call::ListTasks(service_id.to_string()));
        let failures = self.task_list_failures.get();
        if failures > 0 {
            self.task_list_failures.set(failures - 1);
            return Err(SwarmJobError::Api {
                status: Some(500),
                message: "task store unavailable".to_string(),
            });
        }

        let mut script = self.task_script.borrow_mut();
        if script.len() > 1 {
            Ok(script.pop_front().unwrap_or_default())
        } else {
            Ok(script.front().cloned().unwrap_or_default())
        }
    }

    fn service_logs(&self, service_id: &str, _options: &LogOptions) -> Result<LogStream> {
        self.record(Call::ServiceLogs(service_id.to_string()));
        if self.fail_logs {
            return Err(SwarmJobError::Api {
                status: Some(501),
                message: "logs unavailable".to_string(),
            });
        }
        Ok(Box::new(Cursor::new(self.logs.clone())))
    }

    fn remove_service(&self, id: &str) -> Result<()> {
        self.record(Call::RemoveService(id.to_string()));
        if self.fail_remove {
            return Err(Self::not_found("service", id));
        }
        Ok(())
    }
}

/// A task in `state`, with a container status when `exit_code` is given.
pub(crate) fn task(id: &str, state: TaskState, exit_code: Option<i32>) -> Task {
    Task {
        id: id.to_string(),
        service_id: CREATED_SERVICE_ID.to_string(),
        status: TaskStatus {
            state,
            message: String::new(),
            err: None,
            container_status: exit_code.map(|exit_code| ContainerStatus {
                container_id: format!("ctr-{}", id),
                exit_code,
            }),
        },
    }
}

/// One multiplexed log frame.
pub(crate) fn frame(stream: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![stream, 0, 0, 0];
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}
