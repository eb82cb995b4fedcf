//! Container engine side of docker-hosts-writer.
//!
//! # Module Structure
//!
//! - [`error`]: domain error type (`EngineError`)
//! - [`container`]: container metadata (`ContainerSummary`, `ContainerDetails`)
//! - [`event`]: engine events and subscription filters (`EngineEvent`, `EventFilter`)
//! - [`client`]: engine API abstraction (`EngineClient` trait, `BollardEngineClient`)
//! - [`connector`]: retrying connection setup (`Connector`, `EngineFactory`)

pub mod client;
pub mod connector;
pub mod container;
pub mod error;
pub mod event;

// --- Public API Re-exports ---

pub use client::{BollardEngineClient, EngineClient, EventStream};
pub use connector::{BollardFactory, Connector, ConnectorState, EngineFactory};
pub use container::{ContainerDetails, ContainerSummary, EngineVersion};
pub use error::EngineError;
pub use event::{EngineEvent, EventAction, EventFilter, EventKind};
