//! Error types shared across the workspace.
//!
//! [`HostSyncError`] is the top-level error. Each library crate keeps its own
//! domain error (`HostsFileError`, `EngineError`) and converts into the
//! matching sub-enum here, so the daemon can propagate everything with `?`.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum HostSyncError {
    /// Configuration errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Container engine errors
    #[error("engine error: {0}")]
    Engine(#[from] EngineFailure),

    /// Hosts file errors
    #[error("hosts file error: {0}")]
    HostsFile(#[from] HostsFileFailure),

    /// I/O errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostSyncError {
    /// Returns `true` if the error was produced by a cancellation signal
    /// rather than a real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Engine(EngineFailure::Cancelled) | Self::HostsFile(HostsFileFailure::Cancelled)
        )
    }

    /// Returns `true` for errors that must stop the daemon instead of being
    /// logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::HostsFile(HostsFileFailure::NotFound { .. })
        )
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Config file could not be parsed
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A field holds an invalid value
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Container engine failures
#[derive(Debug, thiserror::Error)]
pub enum EngineFailure {
    /// The engine endpoint could not be reached
    #[error("engine unreachable at {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// An engine API call failed
    #[error("engine api error: {0}")]
    Api(String),

    /// The container no longer exists
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// An event could not be interpreted
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// The event stream broke
    #[error("event stream error: {0}")]
    Stream(String),

    /// The operation was cancelled
    #[error("cancelled")]
    Cancelled,
}

/// Hosts file failures
#[derive(Debug, thiserror::Error)]
pub enum HostsFileFailure {
    /// The hosts file does not exist
    #[error("could not find hosts file at: {path}")]
    NotFound { path: String },

    /// The hosts file could not be read
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    /// Every write attempt failed
    #[error("failed to write {path} after {attempts} attempts: {reason}")]
    WriteFailed {
        path: String,
        attempts: u32,
        reason: String,
    },

    /// The write was cancelled during a retry wait
    #[error("cancelled")]
    Cancelled,
}
