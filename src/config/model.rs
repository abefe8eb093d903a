//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for a swarmjob run.
///
/// Loaded from an optional YAML file. Every field has a default and unknown
/// fields are ignored, so an empty file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Monitoring
    // =========================================================================
    /// Delay between task list polls.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Oldest daemon API version that can stream service logs without
    /// experimental mode.
    #[serde(default = "default_min_log_api_version")]
    pub min_log_api_version: String,

    // =========================================================================
    // Orchestrator connection
    // =========================================================================
    /// Daemon endpoint. Falls back to `DOCKER_HOST`, then the local unix socket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_host: Option<String>,

    /// Pin the Engine API version. Falls back to `DOCKER_API_VERSION`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    // =========================================================================
    // Request preparation
    // =========================================================================
    /// How `--command` is tokenized.
    #[serde(default)]
    pub command_tokenizer: CommandTokenizer,

    /// Reject env-file lines without `=` instead of skipping them.
    #[serde(default = "default_true")]
    pub strict_env_files: bool,

    /// Extra labels added to every submitted service.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            min_log_api_version: default_min_log_api_version(),
            docker_host: None,
            api_version: None,
            request_timeout: default_request_timeout(),
            command_tokenizer: CommandTokenizer::default(),
            strict_env_files: default_true(),
            labels: BTreeMap::new(),
        }
    }
}
