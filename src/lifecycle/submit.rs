//! Service submission.

use crate::config::parse_api_version;
use crate::error::{Result, SwarmJobError};
use crate::swarm::{CreateOptions, Orchestrator, ServerVersion, ServiceSpec};
use crate::task::TaskRequest;
use tracing::info;

/// A created service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub service_id: String,
    pub warnings: Vec<String>,
}

/// Fail unless the daemon can stream service logs.
///
/// Streaming needs API `min_version` or newer, or an experimental daemon. An
/// unparsable daemon version counts as too old.
pub fn check_log_support(version: &ServerVersion, min_version: &str) -> Result<()> {
    if version.experimental {
        return Ok(());
    }

    let supported = match (
        parse_api_version(&version.api_version),
        parse_api_version(min_version),
    ) {
        (Some(actual), Some(required)) => actual >= required,
        _ => false,
    };

    if supported {
        Ok(())
    } else {
        Err(SwarmJobError::LogsUnsupported {
            api_version: version.api_version.clone(),
            required: min_version.to_string(),
        })
    }
}

/// Create options for a request. Registry auth is passed through verbatim
/// and turns on registry verification of the image.
pub fn create_options(request: &TaskRequest) -> CreateOptions {
    match request.registry_auth() {
        Some(auth) => CreateOptions {
            registry_auth: Some(auth.to_string()),
            query_registry: true,
        },
        None => CreateOptions::default(),
    }
}

/// Submit the spec and return the new service's identity.
pub fn submit(
    orchestrator: &dyn Orchestrator,
    spec: &ServiceSpec,
    options: &CreateOptions,
) -> Result<Submission> {
    let created = orchestrator.create_service(spec, options).map_err(|e| match e {
        SwarmJobError::Submission(_) | SwarmJobError::Connectivity(_) => e,
        other => SwarmJobError::Submission(other.to_string()),
    })?;

    info!(service_id = %created.id, "service created");
    Ok(Submission {
        service_id: created.id,
        warnings: created.warnings.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(api: &str, experimental: bool) -> ServerVersion {
        ServerVersion {
            api_version: api.to_string(),
            version: "24.0.7".to_string(),
            experimental,
        }
    }

    #[test]
    fn test_new_enough_api_supports_logs() {
        assert!(check_log_support(&version("1.29", false), "1.29").is_ok());
        assert!(check_log_support(&version("1.43", false), "1.29").is_ok());
        assert!(check_log_support(&version("2.0", false), "1.29").is_ok());
    }

    #[test]
    fn test_old_api_needs_experimental() {
        let err = check_log_support(&version("1.28", false), "1.29").unwrap_err();
        assert!(matches!(err, SwarmJobError::LogsUnsupported { .. }));
        assert!(check_log_support(&version("1.28", true), "1.29").is_ok());
    }

    #[test]
    fn test_minor_versions_compare_numerically() {
        assert!(check_log_support(&version("1.100", false), "1.29").is_ok());
        assert!(check_log_support(&version("1.3", false), "1.29").is_err());
    }

    #[test]
    fn test_unparsable_version_is_unsupported() {
        assert!(check_log_support(&version("", false), "1.29").is_err());
        assert!(check_log_support(&version("", true), "1.29").is_ok());
    }

    #[test]
    fn test_registry_auth_enables_registry_query() {
        let request = TaskRequest {
            registry_auth: Some("eyJ1c2VybmFtZSI6ImFsZXgifQ==".to_string()),
            ..TaskRequest::new("private/image", "")
        };
        let options = create_options(&request);
        assert_eq!(
            options.registry_auth.as_deref(),
            Some("eyJ1c2VybmFtZSI6ImFsZXgifQ==")
        );
        assert!(options.query_registry);

        let options = create_options(&TaskRequest::new("busybox", ""));
        assert_eq!(options, CreateOptions::default());
    }
}
