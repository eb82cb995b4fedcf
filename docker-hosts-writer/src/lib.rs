//! docker-hosts-writer library.
//!
//! Exposes the daemon's modules for integration testing.
//! In production, `docker-hosts-writer` is used as a binary (main.rs).

pub mod candidates;
pub mod cli;
pub mod logging;
pub mod metrics_server;
pub mod orchestrator;
pub mod shutdown;

pub use orchestrator::{DaemonState, Orchestrator};
