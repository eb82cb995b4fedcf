//! Engine connector -- (re)establishes a live engine session.
//!
//! [`Connector::connect`] builds a client through an [`EngineFactory`] and
//! probes it with [`EngineClient::version`]. Failures are logged and retried
//! after a fixed delay, forever, until the probe succeeds or the
//! cancellation token fires.
//!
//! ```text
//! Disconnected --connect()--> Connecting --probe ok--> Connected
//!       ^                         |                        |
//!       +------ probe failed -----+---- mark_disconnected -+
//! ```

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hostsync_core::metrics as m;

use crate::client::{BollardEngineClient, EngineClient};
use crate::error::EngineError;

/// Default wait between connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Creates engine clients for an endpoint.
pub trait EngineFactory: Send + Sync + 'static {
    type Client: EngineClient;

    /// Builds a client. Must not block on I/O.
    fn create(&self, endpoint: &str) -> Result<Self::Client, EngineError>;
}

/// Builds [`BollardEngineClient`]s.
#[derive(Debug, Clone)]
pub struct BollardFactory {
    timeout_secs: u64,
}

impl BollardFactory {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

impl Default for BollardFactory {
    fn default() -> Self {
        Self::new(120)
    }
}

impl EngineFactory for BollardFactory {
    type Client = BollardEngineClient;

    fn create(&self, endpoint: &str) -> Result<Self::Client, EngineError> {
        BollardEngineClient::connect(endpoint, self.timeout_secs)
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Retries engine connections until one answers.
pub struct Connector<F: EngineFactory> {
    factory: F,
    endpoint: String,
    retry_delay: Duration,
    state: ConnectorState,
    connects: u64,
}

impl<F: EngineFactory> Connector<F> {
    pub fn new(factory: F, endpoint: impl Into<String>, retry_delay: Duration) -> Self {
        Self {
            factory,
            endpoint: endpoint.into(),
            retry_delay,
            state: ConnectorState::Disconnected,
            connects: 0,
        }
    }

    pub fn state(&self) -> ConnectorState {
        self.state
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Successful connections so far.
    pub fn connects(&self) -> u64 {
        self.connects
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Called when the session in use broke.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectorState::Disconnected;
    }

    /// Returns a client whose version probe succeeded.
    ///
    /// # Errors
    ///
    /// Only [`EngineError::Cancelled`]; every other failure is retried.
    pub async fn connect(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<F::Client, EngineError> {
        let mut attempt: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                self.state = ConnectorState::Disconnected;
                return Err(EngineError::Cancelled);
            }

            attempt += 1;
            self.state = ConnectorState::Connecting;

            let error = match self.factory.create(&self.endpoint) {
                Ok(client) => {
                    let probe = tokio::select! {
                        () = cancel.cancelled() => {
                            self.state = ConnectorState::Disconnected;
                            return Err(EngineError::Cancelled);
                        }
                        result = client.version() => result,
                    };
                    match probe {
                        Ok(version) => {
                            self.state = ConnectorState::Connected;
                            self.connects += 1;
                            metrics::counter!(m::ENGINE_CONNECTS_TOTAL).increment(1);
                            info!(
                                endpoint = %self.endpoint,
                                engine_version = %version.version,
                                api_version = %version.api_version,
                                attempt,
                                "connected to container engine"
                            );
                            return Ok(client);
                        }
                        Err(e) => e,
                    }
                }
                Err(e) => e,
            };

            self.state = ConnectorState::Disconnected;
            metrics::counter!(m::ENGINE_CONNECT_FAILURES_TOTAL).increment(1);
            warn!(
                endpoint = %self.endpoint,
                attempt,
                error = %error,
                "failed to connect to container engine, retrying in {:?}",
                self.retry_delay
            );
            if attempt == 1 {
                warn!(
                    endpoint = %self.endpoint,
                    "the container engine is likely not running at this endpoint; \
                     check the endpoint setting (--endpoint)"
                );
            }

            tokio::select! {
                () = cancel.cancelled() => return Err(EngineError::Cancelled),
                () = tokio::time::sleep(self.retry_delay) => {}
            }
        }
    }
}
