//! Engine events.
//!
//! [`EngineEvent`] is the engine-independent form of a container or network
//! event. Network events carry the container id in the `container` attribute
//! and the network name in `name`; container events carry the container id
//! as the actor id.
//!
//! ```
//! use hostsync_engine::event::{EventAction, EventFilter};
//!
//! let filter = EventFilter::default_subscription();
//! assert!(filter.actions.contains(&EventAction::Connect));
//! assert_eq!(EventAction::parse("die"), EventAction::Die);
//! ```

use std::collections::HashMap;
use std::fmt;

use bollard::models::{EventMessage, EventMessageTypeEnum};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Actor attribute holding the container id of a network event.
pub const ATTR_CONTAINER: &str = "container";

/// Actor attribute holding the network name of a network event.
pub const ATTR_NAME: &str = "name";

/// Object type an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Container,
    Network,
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Network => "network",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventAction {
    /// Container started
    Start,
    /// Container exited
    Die,
    /// Container attached to a network
    Connect,
    /// Container detached from a network
    Disconnect,
    /// Any other action, kept verbatim
    Other(String),
}

impl EventAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "start" => Self::Start,
            "die" => Self::Die,
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Die => "die",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Other(action) => action,
        }
    }

    /// Metric label value; unknown actions collapse to `other`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Die => "die",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Other(_) => "other",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container or network event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub kind: EventKind,
    pub action: EventAction,
    /// Affected container
    pub container_id: String,
    /// Affected network (network events only)
    pub network_name: Option<String>,
    /// Raw actor attributes
    pub attributes: HashMap<String, String>,
}

impl EngineEvent {
    /// Builds a container event.
    pub fn container(action: EventAction, container_id: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Container,
            action,
            container_id: container_id.into(),
            network_name: None,
            attributes: HashMap::new(),
        }
    }

    /// Builds a network event.
    pub fn network(
        action: EventAction,
        container_id: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        let container_id = container_id.into();
        let network = network.into();
        Self {
            kind: EventKind::Network,
            action,
            attributes: HashMap::from([
                (ATTR_CONTAINER.to_owned(), container_id.clone()),
                (ATTR_NAME.to_owned(), network.clone()),
            ]),
            container_id,
            network_name: Some(network),
        }
    }
}

impl TryFrom<EventMessage> for EngineEvent {
    type Error = EngineError;

    fn try_from(message: EventMessage) -> Result<Self, Self::Error> {
        let kind = match message.typ {
            Some(EventMessageTypeEnum::CONTAINER) => EventKind::Container,
            Some(EventMessageTypeEnum::NETWORK) => EventKind::Network,
            _ => EventKind::Other,
        };
        let action = message
            .action
            .as_deref()
            .map(EventAction::parse)
            .ok_or_else(|| EngineError::InvalidEvent("event without action".to_owned()))?;
        let actor = message
            .actor
            .ok_or_else(|| EngineError::InvalidEvent(format!("{kind} {action} event without actor")))?;
        let attributes = actor.attributes.unwrap_or_default();

        let (container_id, network_name) = match kind {
            EventKind::Network => {
                let container_id = attributes.get(ATTR_CONTAINER).cloned().ok_or_else(|| {
                    EngineError::InvalidEvent(format!(
                        "network {action} event without '{ATTR_CONTAINER}' attribute"
                    ))
                })?;
                (container_id, attributes.get(ATTR_NAME).cloned())
            }
            EventKind::Container | EventKind::Other => (actor.id.unwrap_or_default(), None),
        };

        if container_id.is_empty() {
            return Err(EngineError::InvalidEvent(format!(
                "{kind} {action} event without container id"
            )));
        }

        Ok(Self {
            kind,
            action,
            container_id,
            network_name,
            attributes,
        })
    }
}

/// Event subscription filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub kinds: Vec<EventKind>,
    pub actions: Vec<EventAction>,
}

impl EventFilter {
    /// Container `start`/`die` and network `connect`/`disconnect`.
    pub fn default_subscription() -> Self {
        Self {
            kinds: vec![EventKind::Container, EventKind::Network],
            actions: vec![
                EventAction::Start,
                EventAction::Die,
                EventAction::Connect,
                EventAction::Disconnect,
            ],
        }
    }

    /// Engine query filters (`type=...`, `event=...`).
    pub fn to_query(&self) -> HashMap<String, Vec<String>> {
        let mut query = HashMap::new();
        let kinds: Vec<String> = self
            .kinds
            .iter()
            .filter(|k| **k != EventKind::Other)
            .map(|k| k.as_str().to_owned())
            .collect();
        if !kinds.is_empty() {
            query.insert("type".to_owned(), kinds);
        }
        if !self.actions.is_empty() {
            query.insert(
                "event".to_owned(),
                self.actions.iter().map(|a| a.as_str().to_owned()).collect(),
            );
        }
        query
    }

    /// Returns `true` if `event` passes this filter.
    pub fn matches(&self, event: &EngineEvent) -> bool {
        (self.kinds.is_empty() || self.kinds.contains(&event.kind))
            && (self.actions.is_empty() || self.actions.contains(&event.action))
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::default_subscription()
    }
}
