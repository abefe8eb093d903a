//! Implementation of the `swarmjob run` command.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::lifecycle::{self, Console, Outcome};
use crate::swarm::DockerClient;
use crate::task::TaskRequest;
use std::io;
use std::path::Path;
use tracing::debug;

/// Execute the `swarmjob run` command.
///
/// Loads the config, validates the request, connects to the daemon and runs
/// the task, writing progress and task output to the terminal.
pub fn cmd_run(args: RunArgs, config_path: Option<&Path>) -> Result<i32> {
    let config = Config::load_optional(config_path)?;
    let request = args.into_request();
    let client = connect(&request, &config)?;

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut console = Console::new(&mut out, &mut err);

    let outcome = lifecycle::run(&client, &request, &config, &mut console)?;
    match &outcome {
        Outcome::Finished { task_id, state, .. } => debug!(%task_id, %state, "task finished"),
        Outcome::TimedOut { after } => debug!(?after, "task timed out"),
        Outcome::NoService { service_id } => debug!(%service_id, "service not found"),
    }
    Ok(outcome.exit_code())
}

/// Validate the request, then build the daemon client. A bad request is
/// reported before the daemon address is looked at.
fn connect(request: &TaskRequest, config: &Config) -> Result<DockerClient> {
    request.validate()?;
    DockerClient::new(
        &config.docker_host(),
        config.api_version().as_deref(),
        config.request_timeout,
    )
}
