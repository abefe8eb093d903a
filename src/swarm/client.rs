//! Docker Engine API client.
//!
//! A blocking HTTP implementation of [`Orchestrator`]. The daemon is reached
//! over its local unix socket by default (`unix:///var/run/docker.sock`) or
//! over TCP (`tcp://host:port`, `http://...`, `https://...`).

use super::model::{
    CreateOptions, LogOptions, Secret, ServerVersion, Service, ServiceCreateResponse, ServiceSpec,
    Task,
};
use super::{LogStream, Orchestrator};
use crate::error::{Result, SwarmJobError};
use reqwest::Url;
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Endpoint used when neither the config nor `DOCKER_HOST` name one.
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Authority used in request URLs sent over a unix socket.
const UNIX_BASE_URL: &str = "http://localhost";

const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";

/// Production orchestrator backed by the Docker Engine HTTP API.
pub struct DockerClient {
    base_url: String,
    http: Client,
}

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DaemonAddr {
    Http(String),
    Unix(PathBuf),
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DistributionInspect {
    #[serde(rename = "Descriptor")]
    descriptor: Descriptor,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    digest: String,
}

impl DockerClient {
    /// Create a client for `host`, optionally pinned to an API version.
    ///
    /// # Errors
    ///
    /// Returns `Connectivity` when the host scheme is unsupported or the HTTP
    /// client cannot be initialized.
    pub fn new(host: &str, api_version: Option<&str>, timeout: Duration) -> Result<Self> {
        let builder = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(timeout);

        let (builder, mut base_url) = match parse_host(host)? {
            DaemonAddr::Http(url) => (builder, url),
            DaemonAddr::Unix(socket) => {
                debug!(socket = %socket.display(), "using unix socket transport");
                (unix_transport(builder, socket)?, UNIX_BASE_URL.to_string())
            }
        };
        if let Some(version) = api_version.map(str::trim).filter(|v| !v.is_empty()) {
            base_url.push_str("/v");
            base_url.push_str(version.trim_start_matches('v'));
        }

        let http = builder
            .build()
            .map_err(|e| SwarmJobError::Connectivity(e.to_string()))?;

        debug!(%base_url, "docker client configured");
        Ok(Self { base_url, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        Url::parse_with_params(&self.url(path), query).map_err(|e| {
            SwarmJobError::Connectivity(format!("invalid daemon URL '{}': {}", self.url(path), e))
        })
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().map_err(request_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| body.trim().to_string());
        Err(SwarmJobError::Api {
            status: Some(status.as_u16()),
            message,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.send(self.http.get(self.endpoint(path, query)?))?;
        response.json::<T>().map_err(decode_error)
    }

    /// Resolve `image` to a digest-pinned reference using the registry.
    fn pin_image(&self, image: &str, registry_auth: &str) -> Result<String> {
        let request = self
            .http
            .get(self.url(&format!("/distribution/{}/json", image)))
            .header(REGISTRY_AUTH_HEADER, registry_auth);
        let inspect: DistributionInspect = self.send(request)?.json().map_err(decode_error)?;
        Ok(pinned_reference(image, &inspect.descriptor.digest))
    }
}

impl Orchestrator for DockerClient {
    fn server_version(&self) -> Result<ServerVersion> {
        self.get_json("/version", &[]).map_err(|e| match e {
            SwarmJobError::Api { message, .. } => SwarmJobError::Connectivity(message),
            other => other,
        })
    }

    fn list_secrets(&self) -> Result<Vec<Secret>> {
        self.get_json("/secrets", &[])
    }

    fn create_service(
        &self,
        spec: &ServiceSpec,
        options: &CreateOptions,
    ) -> Result<ServiceCreateResponse> {
        let mut spec = spec.clone();
        let mut pin_warning = None;

        if let (Some(auth), true) = (options.registry_auth.as_deref(), options.query_registry)
            && let Some(container) = spec.task_template.container_spec.as_mut()
            && !container.image.is_empty()
        {
            match self.pin_image(&container.image, auth) {
                Ok(pinned) => container.image = pinned,
                Err(e) => {
                    warn!(image = %container.image, error = %e, "unable to pin image to digest");
                    pin_warning = Some(format!(
                        "unable to pin image {} to digest: {}",
                        container.image, e
                    ));
                }
            }
        }

        let mut request = self.http.post(self.url("/services/create")).json(&spec);
        if let Some(auth) = options.registry_auth.as_deref() {
            request = request.header(REGISTRY_AUTH_HEADER, auth);
        }

        let mut created: ServiceCreateResponse =
            self.send(request)
                .and_then(|r| r.json().map_err(decode_error))
                .map_err(|e| match e {
                    SwarmJobError::Api { message, .. } => SwarmJobError::Submission(message),
                    other => other,
                })?;

        if let Some(warning) = pin_warning {
            created.warnings.get_or_insert_with(Vec::new).push(warning);
        }
        Ok(created)
    }

    fn inspect_service(&self, id: &str) -> Result<Service> {
        self.get_json(
            &format!("/services/{}", id),
            &[("insertDefaults", "true".to_string())],
        )
    }

    fn list_services(&self, id: &str) -> Result<Vec<Service>> {
        self.get_json("/services", &[("filters", id_filter("id", id))])
    }

    fn list_tasks(&self, service_id: &str) -> Result<Vec<Task>> {
        self.get_json("/tasks", &[("filters", id_filter("service", service_id))])
    }

    fn service_logs(&self, service_id: &str, options: &LogOptions) -> Result<LogStream> {
        let query = [
            ("follow", flag(options.follow)),
            ("stdout", flag(options.stdout)),
            ("stderr", flag(options.stderr)),
            ("timestamps", flag(options.timestamps)),
            ("details", flag(false)),
            ("tail", options.tail.clone()),
        ];
        let request = self
            .http
            .get(self.endpoint(&format!("/services/{}/logs", service_id), &query)?);
        let response = self.send(request)?;
        Ok(Box::new(response))
    }

    fn remove_service(&self, id: &str) -> Result<()> {
        self.send(self.http.delete(self.url(&format!("/services/{}", id))))?;
        Ok(())
    }
}

/// Parse a `DOCKER_HOST` style address. An empty address means the default
/// local socket.
fn parse_host(host: &str) -> Result<DaemonAddr> {
    let host = host.trim();
    let host = if host.is_empty() {
        DEFAULT_DOCKER_HOST
    } else {
        host
    };

    if let Some(path) = host.strip_prefix("unix://") {
        if path.is_empty() {
            return Err(SwarmJobError::Connectivity(format!(
                "docker host '{}' names no socket path",
                host
            )));
        }
        return Ok(DaemonAddr::Unix(PathBuf::from(path)));
    }

    let host = host.trim_end_matches('/');
    if let Some(rest) = host.strip_prefix("tcp://") {
        return Ok(DaemonAddr::Http(format!("http://{}", rest)));
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        return Ok(DaemonAddr::Http(host.to_string()));
    }

    Err(SwarmJobError::Connectivity(format!(
        "unsupported docker host '{}'.\n\
         Fix: set DOCKER_HOST to unix:///path/to/docker.sock or tcp://host:port.",
        host
    )))
}

#[cfg(unix)]
fn unix_transport(builder: ClientBuilder, socket: PathBuf) -> Result<ClientBuilder> {
    Ok(builder.unix_socket(socket))
}

#[cfg(not(unix))]
fn unix_transport(_builder: ClientBuilder, socket: PathBuf) -> Result<ClientBuilder> {
    Err(SwarmJobError::Connectivity(format!(
        "unix socket {} is not available on this platform.\n\
         Fix: set DOCKER_HOST=tcp://host:port.",
        socket.display()
    )))
}

/// Engine filter encoding: `{"<key>": {"<value>": true}}`.
fn id_filter(key: &str, value: &str) -> String {
    let mut values = Map::new();
    values.insert(value.to_string(), Value::Bool(true));
    let mut filters = Map::new();
    filters.insert(key.to_string(), Value::Object(values));
    Value::Object(filters).to_string()
}

fn flag(value: bool) -> String {
    (if value { "1" } else { "0" }).to_string()
}

fn pinned_reference(image: &str, digest: &str) -> String {
    match image.split_once('@') {
        Some((name, _)) => format!("{}@{}", name, digest),
        None => format!("{}@{}", image, digest),
    }
}

fn request_error(e: reqwest::Error) -> SwarmJobError {
    if e.is_connect() || e.is_timeout() {
        SwarmJobError::Connectivity(e.to_string())
    } else {
        SwarmJobError::Api {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

fn decode_error(e: reqwest::Error) -> SwarmJobError {
    SwarmJobError::Api {
        status: None,
        message: format!("failed to decode response: {}", e),
    }
}
