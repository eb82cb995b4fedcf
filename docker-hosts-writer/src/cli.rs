//! CLI argument definitions for docker-hosts-writer.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.
//! Flags override the config file and environment variables.

use std::path::PathBuf;

use clap::Parser;

use hostsync_core::config::DaemonConfig;

/// Keeps the hosts file in sync with running containers.
///
/// Every running container gets one hosts entry per attached network,
/// named after its hostname, container name and compose labels.
#[derive(Parser, Debug, Default)]
#[command(name = "docker-hosts-writer")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to a docker-hosts-writer.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Engine endpoint (unix:///var/run/docker.sock, npipe://./pipe/docker_engine, tcp://host:2375).
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Hosts file to manage.
    #[arg(short = 'f', long)]
    pub hosts_file: Option<String>,

    /// Prefix added to every domain.
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Suffix added to every domain.
    #[arg(short, long)]
    pub suffix: Option<String>,

    /// Debug logging (same as --log-level debug).
    #[arg(short, long)]
    pub verbose: bool,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Rescan all running containers after every reconnect.
    #[arg(long)]
    pub reconcile_on_reconnect: bool,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Applies flag overrides on top of `config`.
    ///
    /// `--verbose` wins over `--log-level`.
    pub fn apply(&self, config: &mut DaemonConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.engine.endpoint = endpoint.clone();
        }
        if let Some(path) = &self.hosts_file {
            config.hosts.path = path.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.hosts.prefix = prefix.clone();
        }
        if let Some(suffix) = &self.suffix {
            config.hosts.suffix = suffix.clone();
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if self.verbose {
            config.general.log_level = "debug".to_owned();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if self.reconcile_on_reconnect {
            config.engine.reconcile_on_reconnect = true;
        }
    }
}
