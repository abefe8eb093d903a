//! Configuration types and defaults for swarmjob.
//!
//! This module defines enums, constants, and default value functions
//! used by the Config struct.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "SWARMJOB_CONFIG";

/// How the `--command` string is split into argv tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommandTokenizer {
    /// Split on runs of whitespace (default).
    #[default]
    Whitespace,
    /// POSIX shell word splitting, honouring quotes and escapes.
    Shell,
}

pub(crate) fn default_poll_interval() -> Duration {
    Duration::from_millis(50)
}

pub(crate) fn default_min_log_api_version() -> String {
    "1.29".to_string()
}

pub(crate) fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

pub(crate) fn default_true() -> bool {
    true
}
