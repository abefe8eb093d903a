//! The submit-and-monitor lifecycle of one task.
//!
//! [`run`] takes a request from validation through submission, polling, log
//! display and optional cleanup, and returns an [`Outcome`]. It never exits
//! the process; the caller turns the outcome into an exit status.
//!
//! Anything that goes wrong before the service is created aborts the run with
//! an error. After creation only the poll result matters: log streaming and
//! removal failures are reported on the error writer and otherwise ignored.

pub mod cleanup;
pub mod console;
pub mod exit_code;
pub mod poller;
pub mod secrets;
pub mod spec_builder;
pub mod submit;


pub use console::Console;

use crate::config::Config;
use crate::error::{Result, SwarmJobError};
use crate::exit_codes;
use crate::logs;
use crate::swarm::{
    CreateOptions, LogOptions, Orchestrator, ServiceSpec, Task, TaskSpec, TaskState,
};
use crate::task::{PreparedRequest, TaskRequest};
use chrono::{SecondsFormat, Utc};
use poller::PollOutcome;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Label recording who submitted the service.
pub const SUBMITTED_BY_LABEL: &str = "swarmjob.submitted-by";

/// Label recording when the service was submitted.
pub const SUBMITTED_AT_LABEL: &str = "swarmjob.submitted-at";

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A task reached a terminal state.
    Finished {
        task_id: String,
        state: TaskState,
        exit_code: i32,
    },
    /// No task finished before the timeout.
    TimedOut { after: Duration },
    /// The created service was not found when polling started.
    NoService { service_id: String },
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Finished { exit_code, .. } => *exit_code,
            Outcome::TimedOut { .. } => exit_codes::TIMED_OUT,
            Outcome::NoService { .. } => exit_codes::NO_SERVICE,
        }
    }
}

/// Run one task to completion.
///
/// # Errors
///
/// Returns an error for any failure before the service is created. Once it
/// exists, the result is always an [`Outcome`].
pub fn run(
    orchestrator: &dyn Orchestrator,
    request: &TaskRequest,
    config: &Config,
    console: &mut Console<'_>,
) -> Result<Outcome> {
    let prepared = request.prepare(config)?;
    if request.debug {
        print_overrides(&prepared, console);
    }

    let version = orchestrator.server_version().map_err(|e| match e {
        SwarmJobError::Connectivity(_) => e,
        other => SwarmJobError::Connectivity(other.to_string()),
    })?;
    debug!(
        api_version = %version.api_version,
        experimental = version.experimental,
        "connected to orchestrator"
    );
    if request.show_logs {
        submit::check_log_support(&version, &config.min_log_api_version)?;
    }

    let template = match request.base_service() {
        Some(name) => Some(load_template(orchestrator, name)?),
        None => None,
    };

    let mut spec = spec_builder::build_spec(&prepared, template, service_labels(config));
    let secret_refs = secrets::resolve_secrets(orchestrator, &request.secrets)?;
    spec_builder::attach_secrets(&mut spec, secret_refs);

    let options = submit::create_options(request);
    if options.registry_auth.is_some() {
        console.line("Using RegistryAuth");
    }
    if request.debug {
        print_spec(&spec, &options, console);
    }

    let submission = submit::submit(orchestrator, &spec, &options)?;
    let deadline = Instant::now() + prepared.timeout;
    for warning in &submission.warnings {
        warn!(service_id = %submission.service_id, "{}", warning);
    }
    if request.verbose {
        report_created(orchestrator, &submission, console);
    }

    let outcome = match poller::poll(
        orchestrator,
        &submission.service_id,
        deadline,
        config.poll_interval,
        request.verbose,
        console,
    ) {
        PollOutcome::Terminal(task) => {
            finish(orchestrator, request, &spec, &submission.service_id, task, console)
        }
        PollOutcome::TimedOut => {
            console.warn(format!(
                "Timing out after {}.",
                humantime::format_duration(prepared.timeout)
            ));
            Outcome::TimedOut {
                after: prepared.timeout,
            }
        }
        PollOutcome::NoService => {
            warn!(service_id = %submission.service_id, "service disappeared before polling");
            Outcome::NoService {
                service_id: submission.service_id.clone(),
            }
        }
    };

    info!(exit_code = outcome.exit_code(), "run finished");
    Ok(outcome)
}

/// Report the terminal task, then show logs and remove the service as asked.
fn finish(
    orchestrator: &dyn Orchestrator,
    request: &TaskRequest,
    spec: &ServiceSpec,
    service_id: &str,
    task: Task,
    console: &mut Console<'_>,
) -> Outcome {
    let exit_code = exit_code::map_exit_code(&task);
    if request.verbose {
        console.line("\n");
        console.line(format!("Exit code: {}", exit_code));
        console.line(format!("State: {}", task.state()));
        console.line("\n");
    }

    if request.show_logs {
        show_logs(
            orchestrator,
            service_id,
            spec_builder::container_tty(spec),
            request.verbose,
            console,
        );
    }

    if request.remove_service {
        if request.verbose {
            console.line("Removing service...");
        }
        if let Err(e) = cleanup::remove_service(orchestrator, service_id) {
            console.warn(e);
        }
    }

    Outcome::Finished {
        task_id: task.id,
        state: task.status.state,
        exit_code,
    }
}

/// Stream the service's logs to the console. Failures are reported only.
fn show_logs(
    orchestrator: &dyn Orchestrator,
    service_id: &str,
    tty: bool,
    verbose: bool,
    console: &mut Console<'_>,
) {
    if verbose {
        console.line("Printing service logs");
    }

    let stream = match orchestrator.service_logs(service_id, &LogOptions::all(verbose)) {
        Ok(stream) => stream,
        Err(e) => {
            console.warn(format!("Unable to pull service logs.\nError: {}", e));
            return;
        }
    };

    let (out, err) = console.streams();
    match logs::demux(stream, out, err, Some(tty)) {
        Ok(summary) => debug!(
            format = ?summary.format,
            stdout_bytes = summary.stdout_bytes,
            stderr_bytes = summary.stderr_bytes,
            dropped_bytes = summary.dropped_bytes,
            "service logs drained"
        ),
        Err(e) => console.warn(SwarmJobError::LogStream(e.to_string())),
    }

    if verbose {
        console.line("");
    }
}

/// Task template of the `--base` service.
fn load_template(orchestrator: &dyn Orchestrator, name: &str) -> Result<TaskSpec> {
    let service = orchestrator
        .inspect_service(name)
        .map_err(|e| SwarmJobError::BaseService {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    debug!(base = %name, service_id = %service.id, "loaded base service template");
    Ok(service.spec.task_template)
}

/// Submitter identity and time, plus the configured extra labels.
fn service_labels(config: &Config) -> BTreeMap<String, String> {
    let mut labels = config.labels.clone();
    labels.insert(SUBMITTED_BY_LABEL.to_string(), submitter());
    labels.insert(
        SUBMITTED_AT_LABEL.to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    labels
}

fn submitter() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

fn print_overrides(prepared: &PreparedRequest, console: &mut Console<'_>) {
    let request = &prepared.request;
    if let Some(base) = request.base_service() {
        console.line(format!("Running based on {}", base));
        console.line("Listing overrides (if specified) ...");
    }
    console.line(format!("Image: {}", request.image));
    console.line(format!("Command: {:?}", prepared.command));
    console.line(format!("Networks: {:?}", request.networks));
    console.line(format!("Constraints: {:?}", request.constraints));
    console.line(format!("Env: {:?}", request.env_vars));
    console.line(format!("Env-files: {:?}", request.env_files));
    console.line(format!("Secrets: {:?}", request.secrets));
    if request.base_service().is_some() {
        console.line("... end overrides");
    }
    console.line(format!(
        "Timeout: {}",
        humantime::format_duration(prepared.timeout)
    ));
}

fn print_spec(spec: &ServiceSpec, options: &CreateOptions, console: &mut Console<'_>) {
    match serde_json::to_string_pretty(spec) {
        Ok(json) => console.line(format!("Creating service with this spec:\n{}", json)),
        Err(e) => warn!(error = %e, "failed to serialize service spec"),
    }
    console.line(format!(
        "Options:\n\tregistry auth: {}\n\tquery registry: {}",
        if options.registry_auth.is_some() { "<redacted>" } else { "none" },
        options.query_registry
    ));
}

/// Read the created service back for reporting. Failure is not fatal.
fn report_created(
    orchestrator: &dyn Orchestrator,
    submission: &submit::Submission,
    console: &mut Console<'_>,
) {
    match orchestrator.inspect_service(&submission.service_id) {
        Ok(service) => {
            console.line(format!(
                "Service created: {} ({})",
                service.spec.name, submission.service_id
            ));
            if !submission.warnings.is_empty() {
                console.line(format!("Warnings:\n{}", submission.warnings.join("\n")));
            }
        }
        Err(e) => console.warn(format!(
            "error querying service details for {}: {}",
            submission.service_id, e
        )),
    }
}
