//! Error types for the swarmjob CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for swarmjob operations.
///
/// Anything raised before submission aborts the run. `LogStream` and `Cleanup`
/// are only ever reported as warnings after the task outcome is known.
#[derive(Error, Debug)]
pub enum SwarmJobError {
    /// The task request is invalid (missing image, bad timeout, bad mount).
    #[error("{0}")]
    Validation(String),

    /// An env-file could not be read or contains a malformed line.
    #[error("env-file '{}': {reason}", .path.display())]
    EnvFile { path: PathBuf, reason: String },

    /// The config file could not be read, parsed, or failed validation.
    #[error("Invalid config: {0}")]
    Config(String),

    /// The orchestrator could not be reached.
    #[error("Is the Docker daemon running? {0}")]
    Connectivity(String),

    /// Log display was requested but the daemon cannot stream service logs.
    #[error(
        "experimental daemon or Docker API version {required}+ required to display service logs (daemon reports {api_version})"
    )]
    LogsUnsupported {
        api_version: String,
        required: String,
    },

    /// A requested secret name has no matching secret.
    #[error("No existing secret has name that matches {name}")]
    SecretNotFound { name: String },

    /// The secret catalog could not be listed.
    #[error("failed to look up docker secrets: {0}")]
    SecretLookup(String),

    /// The base service template could not be loaded.
    #[error("Error looking up base service {name}: {reason}")]
    BaseService { name: String, reason: String },

    /// The orchestrator refused to create the service.
    #[error("error creating service: {0}")]
    Submission(String),

    /// A collaborator API call failed.
    #[error(
        "orchestrator API error{}: {message}",
        .status.map(|s| format!(" ({})", s)).unwrap_or_default()
    )]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// Service logs could not be fetched or decoded.
    #[error("Streaming error from service logs: {0}")]
    LogStream(String),

    /// The service could not be removed after the run.
    #[error("failed to remove service {service_id}: {reason}")]
    Cleanup { service_id: String, reason: String },
}

impl SwarmJobError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SwarmJobError::Validation(_)
            | SwarmJobError::EnvFile { .. }
            | SwarmJobError::Config(_) => exit_codes::USER_ERROR,
            SwarmJobError::Connectivity(_) => exit_codes::CONNECTIVITY_FAILURE,
            SwarmJobError::LogsUnsupported { .. } => exit_codes::CAPABILITY_FAILURE,
            SwarmJobError::SecretNotFound { .. } | SwarmJobError::SecretLookup(_) => {
                exit_codes::RESOLUTION_FAILURE
            }
            SwarmJobError::BaseService { .. }
            | SwarmJobError::Submission(_)
            | SwarmJobError::Api { .. }
            | SwarmJobError::LogStream(_)
            | SwarmJobError::Cleanup { .. } => exit_codes::SUBMISSION_FAILURE,
        }
    }
}

/// Result type alias for swarmjob operations.
pub type Result<T> = std::result::Result<T, SwarmJobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_share_user_exit_code() {
        let err = SwarmJobError::Validation("must supply a valid --image".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

        let err = SwarmJobError::EnvFile {
            path: PathBuf::from("prod.env"),
            reason: "no separator found in line 3".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn pre_submission_failures_have_distinct_codes() {
        let connectivity = SwarmJobError::Connectivity("refused".to_string());
        let capability = SwarmJobError::LogsUnsupported {
            api_version: "1.24".to_string(),
            required: "1.29".to_string(),
        };
        let secret = SwarmJobError::SecretNotFound {
            name: "db-password".to_string(),
        };

        assert_eq!(connectivity.exit_code(), exit_codes::CONNECTIVITY_FAILURE);
        assert_eq!(capability.exit_code(), exit_codes::CAPABILITY_FAILURE);
        assert_eq!(secret.exit_code(), exit_codes::RESOLUTION_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = SwarmJobError::SecretNotFound {
            name: "db-password".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No existing secret has name that matches db-password"
        );

        let err = SwarmJobError::Api {
            status: Some(404),
            message: "service not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "orchestrator API error (404): service not found"
        );

        let err = SwarmJobError::Api {
            status: None,
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "orchestrator API error: connection reset");
    }
}
