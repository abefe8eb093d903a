//! Task request model for swarmjob.
//!
//! A [`TaskRequest`] is the raw description of one run as the user gave it.
//! [`TaskRequest::prepare`] validates it and resolves everything that can be
//! resolved locally (timeout, command tokens, env-files, mounts) so that no
//! orchestrator call is made for a request that cannot succeed.

use crate::config::{CommandTokenizer, Config};
use crate::envfile::read_env_file;
use crate::error::{Result, SwarmJobError};
use crate::lifecycle::spec_builder::parse_mounts;
use crate::swarm::Mount;
use std::path::PathBuf;
use std::time::Duration;


/// Default `--timeout` value.
pub const DEFAULT_TIMEOUT: &str = "60s";

/// One container run as requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    /// Image reference. Required unless `base_service` is set.
    pub image: String,
    /// Command line for the container, tokenized before submission.
    pub command: String,
    /// `KEY=value` assignments.
    pub env_vars: Vec<String>,
    /// Files holding further `KEY=value` assignments.
    pub env_files: Vec<PathBuf>,
    /// Bind mounts as `source=target`.
    pub mounts: Vec<String>,
    /// Names of existing swarm secrets to expose to the task.
    pub secrets: Vec<String>,
    /// Placement constraint expressions.
    pub constraints: Vec<String>,
    /// Networks to attach. Only the first is used.
    pub networks: Vec<String>,
    /// Encoded registry auth, passed through verbatim.
    pub registry_auth: Option<String>,
    /// Existing service whose task template is cloned.
    pub base_service: Option<String>,
    /// Duration string (`30s`, `1m30s`, `500ms`).
    pub timeout: String,
    pub verbose: bool,
    pub debug: bool,
    pub show_logs: bool,
    pub remove_service: bool,
}

impl Default for TaskRequest {
    fn default() -> Self {
        Self {
            image: String::new(),
            command: String::new(),
            env_vars: Vec::new(),
            env_files: Vec::new(),
            mounts: Vec::new(),
            secrets: Vec::new(),
            constraints: Vec::new(),
            networks: Vec::new(),
            registry_auth: None,
            base_service: None,
            timeout: DEFAULT_TIMEOUT.to_string(),
            verbose: false,
            debug: false,
            show_logs: false,
            remove_service: false,
        }
    }
}

/// A validated request with every locally resolvable field resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub request: TaskRequest,
    pub timeout: Duration,
    pub command: Vec<String>,
    /// Entries read from `env_files`, in file order.
    pub file_env: Vec<String>,
    pub mounts: Vec<Mount>,
}

impl TaskRequest {
    /// Shorthand for a request running `image` with `command`.
    pub fn new(image: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    /// Base service name, if one was given and is non-blank.
    pub fn base_service(&self) -> Option<&str> {
        self.base_service
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Registry auth, if one was given and is non-empty.
    pub fn registry_auth(&self) -> Option<&str> {
        self.registry_auth.as_deref().filter(|s| !s.is_empty())
    }

    /// Check the request invariants that need no I/O.
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() && self.base_service().is_none() {
            return Err(SwarmJobError::Validation(
                "must supply a valid --image, unless --base is used".to_string(),
            ));
        }
        parse_timeout(&self.timeout)?;
        parse_mounts(&self.mounts)?;
        Ok(())
    }

    /// Validate the request and resolve timeout, command, env and mounts.
    pub fn prepare(&self, config: &Config) -> Result<PreparedRequest> {
        self.validate()?;
        let timeout = parse_timeout(&self.timeout)?;
        let command = tokenize_command(&self.command, config.command_tokenizer)?;
        let mounts = parse_mounts(&self.mounts)?;

        let mut file_env = Vec::new();
        for file in &self.env_files {
            file_env.extend(read_env_file(file, config.strict_env_files)?);
        }

        Ok(PreparedRequest {
            request: self.clone(),
            timeout,
            command,
            file_env,
            mounts,
        })
    }
}

/// Parse a duration string such as `30s`, `1ms` or `1m30s`.
pub fn parse_timeout(value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| {
        SwarmJobError::Validation(format!(
            "invalid --timeout '{}': {}\n\
             Fix: use a duration such as 30s, 500ms or 1m30s.",
            value, e
        ))
    })
}

/// Split a command string into argv tokens.
pub fn tokenize_command(command: &str, tokenizer: CommandTokenizer) -> Result<Vec<String>> {
    match tokenizer {
        CommandTokenizer::Whitespace => {
            Ok(command.split_whitespace().map(str::to_string).collect())
        }
        CommandTokenizer::Shell => shell_words::split(command).map_err(|e| {
            SwarmJobError::Validation(format!(
                "failed to parse --command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                command, e
            ))
        }),
    }
}
