//! Shared building blocks of docker-hosts-writer.
//!
//! - [`domain`]: prefix/suffix normalization of domain candidates
//! - [`table`]: the in-memory container -> network -> record table
//! - [`config`]: TOML + environment configuration
//! - [`error`]: the workspace error hierarchy
//! - [`metrics`]: Prometheus metric names

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod table;

// --- re-exports ---

pub use config::DaemonConfig;
pub use domain::{DomainRules, PrefixGuard};
pub use error::{ConfigError, EngineFailure, HostSyncError, HostsFileFailure};
pub use table::{HostRecord, HostSnapshot, HostTable};
