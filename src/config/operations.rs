//! Config loading, validation, and environment resolution.

use super::model::Config;
use super::types::CONFIG_ENV_VAR;
use crate::error::{Result, SwarmJobError};
use crate::swarm::client::DEFAULT_DOCKER_HOST;
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(SwarmJobError::Config)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SwarmJobError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load the config named by `path`, or by `SWARMJOB_CONFIG` when `path` is
    /// `None`. Without either, the defaults are used.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(|| {
            std::env::var(CONFIG_ENV_VAR)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        });

        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| SwarmJobError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `poll_interval` must be positive
    /// - `request_timeout` must be positive
    /// - `min_log_api_version` must look like `MAJOR.MINOR`
    /// - `docker_host`, when set, must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(SwarmJobError::Config(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(SwarmJobError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if parse_api_version(&self.min_log_api_version).is_none() {
            return Err(SwarmJobError::Config(format!(
                "min_log_api_version '{}' is not a MAJOR.MINOR version",
                self.min_log_api_version
            )));
        }

        if let Some(host) = &self.docker_host
            && host.trim().is_empty()
        {
            return Err(SwarmJobError::Config(
                "docker_host must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Daemon endpoint: config, then `DOCKER_HOST`, then the default.
    pub fn docker_host(&self) -> String {
        self.docker_host
            .clone()
            .or_else(|| std::env::var("DOCKER_HOST").ok())
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string())
    }

    /// Pinned API version: config, then `DOCKER_API_VERSION`.
    pub fn api_version(&self) -> Option<String> {
        self.api_version
            .clone()
            .or_else(|| std::env::var("DOCKER_API_VERSION").ok())
            .filter(|v| !v.trim().is_empty())
    }
}

/// Parse an Engine API version such as `1.29` into `(major, minor)`.
///
/// Versions compare numerically per component, so `1.100` is newer than `1.29`.
pub fn parse_api_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.trim().trim_start_matches('v').split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}
