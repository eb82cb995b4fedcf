//! Engine error types
//!
//! [`EngineError`] covers every failure talking to the container engine.
//! `From<EngineError> for HostSyncError` lets the daemon propagate it with `?`.

use hostsync_core::error::{EngineFailure, HostSyncError};

/// Container engine domain error
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// The endpoint could not be reached or the client could not be built
    #[error("engine connection error at {endpoint}: {reason}")]
    Connection {
        /// Engine endpoint
        endpoint: String,
        /// Failure reason
        reason: String,
    },

    /// An API call failed
    #[error("engine api error: {0}")]
    Api(String),

    /// The container does not exist (anymore)
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// An event could not be interpreted; the stream itself is fine
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// The event stream broke
    #[error("event stream error: {0}")]
    Stream(String),

    /// Cancelled by the shutdown signal
    #[error("cancelled")]
    Cancelled,
}

impl EngineError {
    /// Returns `true` if the event stream must be re-established.
    pub fn is_stream_fatal(&self) -> bool {
        matches!(self, Self::Stream(_) | Self::Connection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContainerNotFound(_))
    }
}

impl From<EngineError> for HostSyncError {
    fn from(err: EngineError) -> Self {
        let failure = match err {
            EngineError::Connection { endpoint, reason } => {
                EngineFailure::Unreachable { endpoint, reason }
            }
            EngineError::Api(msg) => EngineFailure::Api(msg),
            EngineError::ContainerNotFound(id) => EngineFailure::ContainerNotFound(id),
            EngineError::InvalidEvent(msg) => EngineFailure::InvalidEvent(msg),
            EngineError::Stream(msg) => EngineFailure::Stream(msg),
            EngineError::Cancelled => EngineFailure::Cancelled,
        };
        HostSyncError::Engine(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_display_names_endpoint() {
        let err = EngineError::Connection {
            endpoint: "unix:///var/run/docker.sock".to_owned(),
            reason: "connection refused".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("unix:///var/run/docker.sock"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn stream_fatality() {
        assert!(EngineError::Stream("eof".to_owned()).is_stream_fatal());
        assert!(
            EngineError::Connection {
                endpoint: "x".to_owned(),
                reason: "y".to_owned()
            }
            .is_stream_fatal()
        );
        assert!(!EngineError::InvalidEvent("no actor".to_owned()).is_stream_fatal());
        assert!(!EngineError::ContainerNotFound("abc".to_owned()).is_stream_fatal());
    }

    #[test]
    fn converts_to_host_sync_error() {
        let err: HostSyncError = EngineError::ContainerNotFound("abc123".to_owned()).into();
        assert!(matches!(
            err,
            HostSyncError::Engine(EngineFailure::ContainerNotFound(ref id)) if id == "abc123"
        ));

        let err: HostSyncError = EngineError::Cancelled.into();
        assert!(err.is_cancelled());

        let err: HostSyncError = EngineError::Connection {
            endpoint: "tcp://127.0.0.1:2375".to_owned(),
            reason: "refused".to_owned(),
        }
        .into();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("127.0.0.1:2375"));
    }
}
