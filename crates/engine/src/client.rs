//! Container engine API abstraction for testability.
//!
//! The [`EngineClient`] trait abstracts the bollard Docker API, allowing
//! production code to use [`BollardEngineClient`] while tests use
//! `MockEngineClient`.
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────┐
//!   │ Orchestrator │
//!   └──────┬───────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │EngineClient │ (trait)
//!   └─────────────┘
//!        │     │
//!        ▼     ▼
//!  ┌───────┐ ┌────┐
//!  │Bollard│ │Mock│
//!  └───┬───┘ └────┘
//!      │
//!      ▼
//!  Docker Engine
//! ```
//!
//! # Container ID Validation
//!
//! `inspect_container` validates ids before calling the API:
//! - Must be 1-64 characters
//! - Must contain only ASCII hex digits ([0-9a-fA-F])

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use bollard::models::EndpointSettings;
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::container::{ContainerDetails, ContainerSummary, EngineVersion};
use crate::error::EngineError;
use crate::event::{EngineEvent, EventFilter};

/// Boxed stream of engine events.
///
/// An `Err` item with [`EngineError::is_stream_fatal`] ends the
/// subscription; other errors concern a single event.
pub type EventStream = BoxStream<'static, Result<EngineEvent, EngineError>>;

/// Validates a container ID before it is put into an API path.
///
/// Docker container IDs are 64-character hex strings (or shorter prefix forms).
pub fn validate_container_id(id: &str) -> Result<(), EngineError> {
    if id.is_empty() || id.len() > 64 {
        return Err(EngineError::Api(format!(
            "invalid container ID: length {} (must be 1-64)",
            id.len()
        )));
    }
    if !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EngineError::Api(
            "invalid container ID: contains non-hex characters".to_owned(),
        ));
    }
    Ok(())
}

/// Trait abstracting container engine operations.
///
/// The trait is `Send + Sync + 'static`, allowing safe sharing across async
/// contexts.
///
/// # Error Handling
///
/// - **404 errors**: converted to `EngineError::ContainerNotFound`
/// - **transport errors**: `EngineError::Connection`
/// - **everything else**: `EngineError::Api`
pub trait EngineClient: Send + Sync + 'static {
    /// Identity probe; succeeds only when the engine answers.
    fn version(&self) -> impl Future<Output = Result<EngineVersion, EngineError>> + Send;

    /// Lists running containers with their network addresses.
    fn list_running_containers(
        &self,
    ) -> impl Future<Output = Result<Vec<ContainerSummary>, EngineError>> + Send;

    /// Inspects a single container.
    fn inspect_container(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<ContainerDetails, EngineError>> + Send;

    /// Subscribes to events matching `filter`.
    ///
    /// The stream ends or yields a fatal error when the engine goes away.
    fn events(&self, filter: &EventFilter) -> EventStream;
}

/// Production engine client using `bollard`.
///
/// Supported endpoints:
/// - `unix:///path/to/docker.sock` or a bare socket path
/// - `npipe://./pipe/docker_engine` (Windows)
/// - `tcp://host:port`, `http://host:port`
#[derive(Clone)]
pub struct BollardEngineClient {
    docker: Arc<bollard::Docker>,
    endpoint: String,
}

impl BollardEngineClient {
    /// Builds a client for `endpoint`.
    ///
    /// No request is made; use [`EngineClient::version`] to check liveness.
    pub fn connect(endpoint: &str, timeout_secs: u64) -> Result<Self, EngineError> {
        let connection_error = |e: bollard::errors::Error| EngineError::Connection {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        };

        let docker = if let Some(path) = endpoint.strip_prefix("unix://") {
            bollard::Docker::connect_with_socket(path, timeout_secs, bollard::API_DEFAULT_VERSION)
                .map_err(connection_error)?
        } else if endpoint.starts_with('/') {
            bollard::Docker::connect_with_socket(endpoint, timeout_secs, bollard::API_DEFAULT_VERSION)
                .map_err(connection_error)?
        } else if let Some(pipe) = endpoint.strip_prefix("npipe:") {
            connect_named_pipe(endpoint, pipe, timeout_secs)?
        } else if endpoint.starts_with("tcp://") || endpoint.starts_with("http://") {
            bollard::Docker::connect_with_http(endpoint, timeout_secs, bollard::API_DEFAULT_VERSION)
                .map_err(connection_error)?
        } else {
            return Err(EngineError::Connection {
                endpoint: endpoint.to_owned(),
                reason: "unsupported endpoint scheme (expected unix://, npipe://, tcp:// or http://)"
                    .to_owned(),
            });
        };

        Ok(Self {
            docker: Arc::new(docker),
            endpoint: endpoint.to_owned(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Server responses become `Api`; anything else means the engine is
    /// not reachable.
    fn map_error(&self, context: &str, e: bollard::errors::Error) -> EngineError {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code,
                message,
            } => EngineError::Api(format!("{context}: {status_code} {message}")),
            other => EngineError::Connection {
                endpoint: self.endpoint.clone(),
                reason: format!("{context}: {other}"),
            },
        }
    }
}

#[cfg(windows)]
fn connect_named_pipe(
    endpoint: &str,
    pipe: &str,
    timeout_secs: u64,
) -> Result<bollard::Docker, EngineError> {
    bollard::Docker::connect_with_named_pipe(pipe, timeout_secs, bollard::API_DEFAULT_VERSION)
        .map_err(|e| EngineError::Connection {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })
}

#[cfg(not(windows))]
fn connect_named_pipe(
    endpoint: &str,
    _pipe: &str,
    _timeout_secs: u64,
) -> Result<bollard::Docker, EngineError> {
    Err(EngineError::Connection {
        endpoint: endpoint.to_owned(),
        reason: "named pipes are only supported on Windows".to_owned(),
    })
}

/// Network name -> IP address; endpoints without an address are skipped.
fn network_addresses(networks: Option<HashMap<String, EndpointSettings>>) -> BTreeMap<String, String> {
    networks
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, settings)| {
            settings
                .ip_address
                .filter(|ip| !ip.is_empty())
                .map(|ip| (name, ip))
        })
        .collect()
}

impl EngineClient for BollardEngineClient {
    async fn version(&self) -> Result<EngineVersion, EngineError> {
        let version = self
            .docker
            .version()
            .await
            .map_err(|e| self.map_error("version failed", e))?;
        Ok(EngineVersion {
            version: version.version.unwrap_or_default(),
            api_version: version.api_version.unwrap_or_default(),
        })
    }

    async fn list_running_containers(&self) -> Result<Vec<ContainerSummary>, EngineError> {
        use bollard::container::ListContainersOptions;

        let options = ListContainersOptions::<String> {
            all: false,
            filters: HashMap::from([("status".to_owned(), vec!["running".to_owned()])]),
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| self.map_error("list containers failed", e))?;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let id = c.id.filter(|id| !id.is_empty())?;
                let networks = network_addresses(c.network_settings.and_then(|n| n.networks));
                Some(ContainerSummary { id, networks })
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, EngineError> {
        validate_container_id(id)?;

        let details = self
            .docker
            .inspect_container(id, None)
            .await
            .map_err(|e| match e {
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                } => EngineError::ContainerNotFound(id.to_owned()),
                other => self.map_error("inspect container failed", other),
            })?;

        let (hostname, labels) = details
            .config
            .map(|c| (c.hostname.unwrap_or_default(), c.labels.unwrap_or_default()))
            .unwrap_or_default();

        Ok(ContainerDetails {
            id: details.id.unwrap_or_else(|| id.to_owned()),
            name: details.name.unwrap_or_default(),
            hostname,
            labels,
            networks: network_addresses(details.network_settings.and_then(|n| n.networks)),
        })
    }

    fn events(&self, filter: &EventFilter) -> EventStream {
        use bollard::system::EventsOptions;

        let options = EventsOptions::<String> {
            filters: filter.to_query(),
            ..Default::default()
        };

        self.docker
            .events(Some(options))
            .map(|item| match item {
                Ok(message) => EngineEvent::try_from(message),
                Err(e) => Err(EngineError::Stream(e.to_string())),
            })
            .boxed()
    }
}

/// Mock engine client for tests.
///
/// Returns configurable responses so connector logic can be tested without
/// an engine.
#[cfg(test)]
#[derive(Default)]
pub struct MockEngineClient {
    /// Containers returned by list/inspect
    pub containers: Vec<ContainerDetails>,
    /// Events replayed by `events`
    pub events: Vec<Result<EngineEvent, EngineError>>,
    /// Make the version probe fail
    pub fail_version: bool,
}

#[cfg(test)]
impl MockEngineClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers(mut self, containers: Vec<ContainerDetails>) -> Self {
        self.containers = containers;
        self
    }

    pub fn with_events(mut self, events: Vec<Result<EngineEvent, EngineError>>) -> Self {
        self.events = events;
        self
    }

    pub fn with_failing_version(mut self) -> Self {
        self.fail_version = true;
        self
    }
}

#[cfg(test)]
impl EngineClient for MockEngineClient {
    async fn version(&self) -> Result<EngineVersion, EngineError> {
        if self.fail_version {
            return Err(EngineError::Connection {
                endpoint: "mock://".to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        Ok(EngineVersion {
            version: "27.0.0-mock".to_owned(),
            api_version: "1.47".to_owned(),
        })
    }

    async fn list_running_containers(&self) -> Result<Vec<ContainerSummary>, EngineError> {
        Ok(self
            .containers
            .iter()
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                networks: c.networks.clone(),
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, EngineError> {
        self.containers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| EngineError::ContainerNotFound(id.to_owned()))
    }

    fn events(&self, filter: &EventFilter) -> EventStream {
        let filter = filter.clone();
        let events: Vec<_> = self
            .events
            .iter()
            .filter(|e| match e {
                Ok(event) => filter.matches(event),
                Err(_) => true,
            })
            .cloned()
            .collect();
        futures::stream::iter(events).boxed()
    }
}
