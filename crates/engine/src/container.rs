//! Container metadata returned by the engine.
//!
//! Only the fields the host table needs are kept: ids, names, labels and
//! the IP address per attached network.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Compose project label key.
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";

/// Compose service label key.
pub const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";

/// Engine identity returned by the version probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVersion {
    /// Engine version (e.g. `27.3.1`)
    pub version: String,
    /// API version (e.g. `1.47`)
    pub api_version: String,
}

/// A running container as returned by the list call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// Full container id
    pub id: String,
    /// Network name -> IP address
    pub networks: BTreeMap<String, String>,
}

/// Inspected container metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDetails {
    /// Full container id
    pub id: String,
    /// Container name as reported by the engine (leading `/` included)
    pub name: String,
    /// Configured hostname
    pub hostname: String,
    /// Container labels
    pub labels: HashMap<String, String>,
    /// Network name -> IP address
    pub networks: BTreeMap<String, String>,
}

impl ContainerDetails {
    /// Name without the leading `/`.
    pub fn display_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }

    /// IP address on `network`, if attached.
    pub fn ip_on(&self, network: &str) -> Option<&str> {
        self.networks.get(network).map(String::as_str)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn compose_project(&self) -> Option<&str> {
        self.label(COMPOSE_PROJECT_LABEL)
    }

    pub fn compose_service(&self) -> Option<&str> {
        self.label(COMPOSE_SERVICE_LABEL)
    }
}
