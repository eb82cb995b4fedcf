//! Configuration -- `docker-hosts-writer.toml` parsing and runtime settings.
//!
//! [`DaemonConfig`] holds every setting of the daemon.
//!
//! # Load order
//! 1. CLI flags (highest)
//! 2. Environment variables (`DOCKER_HOSTS_HOSTS_SUFFIX=.lan` style)
//! 3. Config file
//! 4. Defaults (`Default` impls, platform dependent)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), hostsync_core::error::HostSyncError> {
//! use hostsync_core::config::DaemonConfig;
//!
//! // File + environment overrides
//! let config = DaemonConfig::load("/etc/docker-hosts-writer.toml").await?;
//!
//! // Straight from a TOML string
//! let config = DaemonConfig::parse("[hosts]\nsuffix = \".lan\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{DomainRules, PrefixGuard};
use crate::error::{ConfigError, HostSyncError};

/// Upper bound for `hosts.write_retries`.
const MAX_WRITE_RETRIES: u32 = 10;

/// Upper bound for any delay setting, in seconds.
const MAX_DELAY_SECS: u64 = 3600;

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Logging settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Container engine connection
    #[serde(default)]
    pub engine: EngineConfig,
    /// Hosts file and domain naming
    #[serde(default)]
    pub hosts: HostsConfig,
    /// Prometheus exporter
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl DaemonConfig {
    /// Loads a TOML file, applies environment overrides, and validates.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HostSyncError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Result<Self, HostSyncError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file without environment overrides.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HostSyncError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HostSyncError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HostSyncError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, HostSyncError> {
        toml::from_str(toml_str).map_err(|e| {
            HostSyncError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Applies `DOCKER_HOSTS_{SECTION}_{FIELD}` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "DOCKER_HOSTS_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "DOCKER_HOSTS_GENERAL_LOG_FORMAT");

        override_string(&mut self.engine.endpoint, "DOCKER_HOSTS_ENGINE_ENDPOINT");
        override_u64(
            &mut self.engine.reconnect_delay_secs,
            "DOCKER_HOSTS_ENGINE_RECONNECT_DELAY_SECS",
        );
        override_u64(
            &mut self.engine.connect_timeout_secs,
            "DOCKER_HOSTS_ENGINE_CONNECT_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.engine.reconcile_on_reconnect,
            "DOCKER_HOSTS_ENGINE_RECONCILE_ON_RECONNECT",
        );

        override_string(&mut self.hosts.path, "DOCKER_HOSTS_HOSTS_PATH");
        override_string(&mut self.hosts.prefix, "DOCKER_HOSTS_HOSTS_PREFIX");
        override_string(&mut self.hosts.suffix, "DOCKER_HOSTS_HOSTS_SUFFIX");
        override_u32(&mut self.hosts.write_retries, "DOCKER_HOSTS_HOSTS_WRITE_RETRIES");
        override_u64(
            &mut self.hosts.write_retry_delay_secs,
            "DOCKER_HOSTS_HOSTS_WRITE_RETRY_DELAY_SECS",
        );
        override_prefix_guard(&mut self.hosts.prefix_guard, "DOCKER_HOSTS_HOSTS_PREFIX_GUARD");

        override_bool(&mut self.metrics.enabled, "DOCKER_HOSTS_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "DOCKER_HOSTS_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "DOCKER_HOSTS_METRICS_PORT");
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), HostSyncError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.engine.endpoint.trim().is_empty() {
            return Err(invalid("engine.endpoint", "must not be empty"));
        }

        if self.engine.reconnect_delay_secs == 0 || self.engine.reconnect_delay_secs > MAX_DELAY_SECS {
            return Err(invalid(
                "engine.reconnect_delay_secs",
                format!("must be 1-{MAX_DELAY_SECS}"),
            ));
        }

        if self.engine.connect_timeout_secs == 0 {
            return Err(invalid("engine.connect_timeout_secs", "must be greater than 0"));
        }

        if self.hosts.path.trim().is_empty() {
            return Err(invalid("hosts.path", "must not be empty"));
        }

        if self.hosts.write_retries > MAX_WRITE_RETRIES {
            return Err(invalid(
                "hosts.write_retries",
                format!("must be 0-{MAX_WRITE_RETRIES}"),
            ));
        }

        if self.hosts.write_retry_delay_secs > MAX_DELAY_SECS {
            return Err(invalid(
                "hosts.write_retry_delay_secs",
                format!("must be 0-{MAX_DELAY_SECS}"),
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must not be 0 when metrics are enabled"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> HostSyncError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log format (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// Container engine connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine API endpoint (`unix://`, `npipe://`)
    pub endpoint: String,
    /// Wait between connection attempts (seconds)
    pub reconnect_delay_secs: u64,
    /// Per-request timeout of the engine client (seconds)
    pub connect_timeout_secs: u64,
    /// Re-run the full container scan after every reconnect, not only at startup
    pub reconcile_on_reconnect: bool,
}

impl EngineConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint().to_owned(),
            reconnect_delay_secs: 5,
            connect_timeout_secs: 120,
            reconcile_on_reconnect: false,
        }
    }
}

/// Hosts file and domain naming settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostsConfig {
    /// Hosts file location
    pub path: String,
    /// Prefix for every domain
    pub prefix: String,
    /// Suffix for every domain
    pub suffix: String,
    /// Which string guards the prefix step
    pub prefix_guard: PrefixGuard,
    /// Extra write attempts after the first one fails
    pub write_retries: u32,
    /// Wait between write attempts (seconds)
    pub write_retry_delay_secs: u64,
}

impl HostsConfig {
    /// Builds the normalization rules for the host table.
    pub fn domain_rules(&self) -> DomainRules {
        DomainRules::new(self.prefix.clone(), self.suffix.clone()).with_guard(self.prefix_guard)
    }

    pub fn write_retry_delay(&self) -> Duration {
        Duration::from_secs(self.write_retry_delay_secs)
    }
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            path: default_hosts_path(),
            prefix: String::new(),
            suffix: ".docker".to_owned(),
            prefix_guard: PrefixGuard::default(),
            write_retries: 3,
            write_retry_delay_secs: 2,
        }
    }
}

/// Prometheus exporter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `/metrics`
    pub enabled: bool,
    /// Listen address
    pub listen_addr: String,
    /// Listen port
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
        }
    }
}

/// Default engine endpoint for the current platform.
pub fn default_endpoint() -> &'static str {
    if cfg!(windows) {
        "npipe://./pipe/docker_engine"
    } else {
        "unix:///var/run/docker.sock"
    }
}

/// Default hosts file location for the current platform.
pub fn default_hosts_path() -> String {
    if cfg!(windows) {
        let windir = std::env::var("windir").unwrap_or_else(|_| "C:\\Windows".to_owned());
        format!("{windir}\\system32\\drivers\\etc\\hosts")
    } else {
        "/etc/hosts".to_owned()
    }
}

// --- environment override helpers ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_prefix_guard(target: &mut PrefixGuard, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().to_ascii_lowercase().as_str() {
            "suffix" => *target = PrefixGuard::Suffix,
            "prefix" => *target = PrefixGuard::Prefix,
            _ => warn!(
                env_key,
                value = val.as_str(),
                "prefix guard must be \"suffix\" or \"prefix\", ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
