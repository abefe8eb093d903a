//! CLI argument parsing for swarmjob.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::task::{DEFAULT_TIMEOUT, TaskRequest};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// swarmjob: run a one-shot container on a Docker Swarm and relay its exit code.
///
/// The task is submitted as a service that never restarts. swarmjob waits for
/// it to finish, prints its logs and exits with the container's exit code.
#[derive(Parser, Debug)]
#[command(name = "swarmjob")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a YAML config file (defaults to $SWARMJOB_CONFIG).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Diagnostic log level (overrides $SWARMJOB_LOG).
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,
}

/// Diagnostic log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Available commands for swarmjob.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a container to completion as a one-shot service.
    ///
    /// Exits with the container's exit code. A rejected task that reports 0
    /// exits with 255.
    Run(RunArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Image to run. Required unless --base is used.
    #[arg(short, long, default_value = "")]
    pub image: String,

    /// Command to run in the container.
    #[arg(short, long, default_value = "")]
    pub command: String,

    /// Environment variable as KEY=value (repeatable).
    #[arg(short, long = "env")]
    pub env: Vec<String>,

    /// File of KEY=value lines (repeatable).
    #[arg(long = "env-file")]
    pub env_file: Vec<PathBuf>,

    /// Bind mount as src=dest (repeatable).
    #[arg(short, long = "mount")]
    pub mount: Vec<String>,

    /// Name of an existing secret to expose (repeatable).
    #[arg(short, long = "secret")]
    pub secret: Vec<String>,

    /// Placement constraint, e.g. node.role==worker (repeatable).
    #[arg(long = "constraint")]
    pub constraint: Vec<String>,

    /// Network to attach. Only the first one is used.
    #[arg(short, long = "network")]
    pub network: Vec<String>,

    /// Encoded registry auth for private images.
    #[arg(short, long)]
    pub registry_auth: Option<String>,

    /// Existing service whose task template is used as the base.
    #[arg(short, long)]
    pub base: Option<String>,

    /// How long to wait for the task, e.g. 30s, 500ms, 1m30s.
    #[arg(short, long, default_value = DEFAULT_TIMEOUT)]
    pub timeout: String,

    /// Print progress while waiting.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the request overrides and the submitted spec.
    #[arg(long)]
    pub debug: bool,

    /// Print the service logs once the task finishes.
    #[arg(short = 'l', long, default_value_t = true, action = ArgAction::Set)]
    pub show_logs: bool,

    /// Remove the service once the task finishes.
    #[arg(long, alias = "rm")]
    pub remove: bool,
}

impl RunArgs {
    /// The task request these arguments describe.
    pub fn into_request(self) -> TaskRequest {
        TaskRequest {
            image: self.image,
            command: self.command,
            env_vars: self.env,
            env_files: self.env_file,
            mounts: self.mount,
            secrets: self.secret,
            constraints: self.constraint,
            networks: self.network,
            registry_auth: self.registry_auth,
            base_service: self.base,
            timeout: self.timeout,
            verbose: self.verbose,
            debug: self.debug,
            show_logs: self.show_logs,
            remove_service: self.remove,
        }
    }
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Whether the command asked for verbose or debug output.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Command::Run(args) => args.verbose || args.debug,
        }
    }
}
