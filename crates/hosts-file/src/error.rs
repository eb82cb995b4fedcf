//! Hosts file error types
//!
//! [`HostsFileError`] covers reading, rendering and writing the hosts file.
//! `From<HostsFileError> for HostSyncError` lets the daemon propagate it
//! with `?`.

use hostsync_core::error::{HostSyncError, HostsFileFailure};

/// Hosts file domain error
#[derive(Debug, thiserror::Error)]
pub enum HostsFileError {
    /// The hosts file does not exist. Treated as a configuration error.
    #[error("could not find hosts file at: {path}")]
    NotFound {
        /// Hosts file path
        path: String,
    },

    /// Reading the hosts file failed
    #[error("failed to read {path}: {source}")]
    Read {
        /// Hosts file path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Every write attempt failed
    #[error("failed to write {path} after {attempts} attempts: {source}")]
    WriteFailed {
        /// Hosts file path
        path: String,
        /// Attempts made, first try included
        attempts: u32,
        /// Error of the last attempt
        source: std::io::Error,
    },

    /// Cancelled while waiting to retry
    #[error("write cancelled")]
    Cancelled,
}

impl HostsFileError {
    /// Returns `true` for the missing-file configuration error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<HostsFileError> for HostSyncError {
    fn from(err: HostsFileError) -> Self {
        let failure = match err {
            HostsFileError::NotFound { path } => HostsFileFailure::NotFound { path },
            HostsFileError::Read { path, source } => HostsFileFailure::Read {
                path,
                reason: source.to_string(),
            },
            HostsFileError::WriteFailed {
                path,
                attempts,
                source,
            } => HostsFileFailure::WriteFailed {
                path,
                attempts,
                reason: source.to_string(),
            },
            HostsFileError::Cancelled => HostsFileFailure::Cancelled,
        };
        HostSyncError::HostsFile(failure)
    }
}
