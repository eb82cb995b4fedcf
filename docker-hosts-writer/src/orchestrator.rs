//! Event orchestration: connection, reconciliation, and the event loop.
//!
//! The [`Orchestrator`] owns the host table and is the only thing that
//! mutates it. Events are consumed one at a time from the engine stream, so
//! table update, render and write never overlap and no lock is needed.
//!
//! # States
//!
//! ```text
//! Initializing -> Reconciling -> Monitoring -> Reconnecting -> Initializing ...
//!                                                 any state -> Shutdown
//! ```
//!
//! Reconciling runs on the first connection only, unless
//! `reconcile_on_reconnect` is set.

use std::fmt;
use std::time::Instant;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hostsync_core::config::DaemonConfig;
use hostsync_core::error::HostSyncError;
use hostsync_core::metrics as m;
use hostsync_core::{DomainRules, HostTable};
use hostsync_engine::{
    Connector, ContainerDetails, EngineClient, EngineError, EngineEvent, EngineFactory,
    EventAction, EventFilter,
};
use hostsync_hosts_file::{FileSink, HostsFile, HostsFileError, RetryWriter, StdFileSink, short_id};

use crate::candidates::domain_candidates;

/// Daemon lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    /// Connecting to the engine
    Initializing,
    /// Seeding the table from running containers
    Reconciling,
    /// Consuming the event stream
    Monitoring,
    /// Stream lost, waiting before the next connection
    Reconnecting,
    /// Cancelled
    Shutdown,
}

impl fmt::Display for DaemonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initializing => "initializing",
            Self::Reconciling => "reconciling",
            Self::Monitoring => "monitoring",
            Self::Reconnecting => "reconnecting",
            Self::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

/// Why the event loop returned.
enum MonitorExit {
    Cancelled,
    StreamLost,
}

/// The daemon's main loop.
pub struct Orchestrator<F: EngineFactory, S: FileSink = StdFileSink> {
    connector: Connector<F>,
    table: HostTable,
    hosts: HostsFile,
    writer: RetryWriter<S>,
    filter: EventFilter,
    reconcile_on_reconnect: bool,
    reconciled: bool,
    state: DaemonState,
}

impl<F: EngineFactory> Orchestrator<F, StdFileSink> {
    /// Builds an orchestrator writing through the filesystem.
    pub fn from_config(config: &DaemonConfig, factory: F) -> Self {
        let connector = Connector::new(
            factory,
            config.engine.endpoint.clone(),
            config.engine.reconnect_delay(),
        );
        let writer = RetryWriter::new(
            config.hosts.write_retries,
            config.hosts.write_retry_delay(),
        );
        Self::new(
            connector,
            config.hosts.domain_rules(),
            HostsFile::new(&config.hosts.path),
            writer,
        )
        .with_reconcile_on_reconnect(config.engine.reconcile_on_reconnect)
    }
}

impl<F: EngineFactory, S: FileSink> Orchestrator<F, S> {
    pub fn new(
        connector: Connector<F>,
        rules: DomainRules,
        hosts: HostsFile,
        writer: RetryWriter<S>,
    ) -> Self {
        Self {
            connector,
            table: HostTable::new(rules),
            hosts,
            writer,
            filter: EventFilter::default_subscription(),
            reconcile_on_reconnect: false,
            reconciled: false,
            state: DaemonState::Initializing,
        }
    }

    /// Rescan all running containers after every reconnect, not only the first.
    pub fn with_reconcile_on_reconnect(mut self, enabled: bool) -> Self {
        self.reconcile_on_reconnect = enabled;
        self
    }

    pub fn state(&self) -> DaemonState {
        self.state
    }

    pub fn table(&self) -> &HostTable {
        &self.table
    }

    pub fn hosts_file(&self) -> &HostsFile {
        &self.hosts
    }

    pub fn connector(&self) -> &Connector<F> {
        &self.connector
    }

    /// Runs until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Only when the hosts file does not exist at startup. Failures after
    /// that are logged and the loop carries on.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<(), HostSyncError> {
        self.hosts.ensure_exists().await?;

        loop {
            self.transition(DaemonState::Initializing);
            let client = match self.connector.connect(cancel).await {
                Ok(client) => client,
                Err(e) => {
                    debug!(error = %e, "connector stopped");
                    break;
                }
            };

            if !self.reconciled || self.reconcile_on_reconnect {
                self.transition(DaemonState::Reconciling);
                match self.reconcile(&client, cancel).await {
                    Ok(()) => self.reconciled = true,
                    Err(e) if e.is_cancelled() => break,
                    Err(e) => {
                        warn!(error = %e, "reconciliation failed");
                        if !self.wait_before_reconnect(cancel).await {
                            break;
                        }
                        continue;
                    }
                }
            }

            self.transition(DaemonState::Monitoring);
            match self.monitor(&client, cancel).await {
                MonitorExit::Cancelled => break,
                MonitorExit::StreamLost => {
                    metrics::counter!(m::ENGINE_STREAM_INTERRUPTIONS_TOTAL).increment(1);
                    if !self.wait_before_reconnect(cancel).await {
                        break;
                    }
                }
            }
        }

        self.transition(DaemonState::Shutdown);
        Ok(())
    }

    /// Rebuilds the table from every running container and writes once.
    async fn reconcile(
        &mut self,
        client: &F::Client,
        cancel: &CancellationToken,
    ) -> Result<(), HostSyncError> {
        let containers = tokio::select! {
            () = cancel.cancelled() => return Err(EngineError::Cancelled.into()),
            result = client.list_running_containers() => result?,
        };

        self.table.clear();
        for summary in &containers {
            let inspected = tokio::select! {
                () = cancel.cancelled() => return Err(EngineError::Cancelled.into()),
                result = client.inspect_container(&summary.id) => result,
            };
            match inspected {
                Ok(details) => self.upsert_all(&details),
                Err(e) => warn!(
                    container_id = %short_id(&summary.id),
                    error = %e,
                    "failed to inspect container, skipping"
                ),
            }
        }

        info!(
            running = containers.len(),
            tracked = self.table.len(),
            "reconciled running containers"
        );

        if let Err(e) = self.flush(cancel).await {
            if matches!(e, HostsFileError::Cancelled) {
                return Err(e.into());
            }
            error!(error = %e, "failed to write hosts file after reconciliation");
        }
        Ok(())
    }

    /// Consumes the event stream until it breaks or `cancel` fires.
    async fn monitor(&mut self, client: &F::Client, cancel: &CancellationToken) -> MonitorExit {
        let mut stream = client.events(&self.filter);
        info!(endpoint = %self.connector.endpoint(), "listening for container events");

        loop {
            let next = tokio::select! {
                () = cancel.cancelled() => return MonitorExit::Cancelled,
                next = stream.next() => next,
            };

            match next {
                None => {
                    warn!("event stream ended");
                    return MonitorExit::StreamLost;
                }
                Some(Err(e)) if e.is_stream_fatal() => {
                    warn!(error = %e, "event stream interrupted");
                    return MonitorExit::StreamLost;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "skipping unreadable event");
                }
                Some(Ok(event)) => {
                    let action = event.action.label();
                    metrics::counter!(m::EVENTS_RECEIVED_TOTAL, m::LABEL_ACTION => action)
                        .increment(1);

                    match self.handle_event(client, &event, cancel).await {
                        Ok(()) => {}
                        Err(e) if e.is_cancelled() => return MonitorExit::Cancelled,
                        Err(e) => {
                            metrics::counter!(m::EVENTS_FAILED_TOTAL, m::LABEL_ACTION => action)
                                .increment(1);
                            error!(
                                container_id = %short_id(&event.container_id),
                                action,
                                error = %e,
                                "failed to handle event"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Applies one event to the table and rewrites the hosts file.
    ///
    /// Actions outside start/die/connect/disconnect are ignored without a
    /// write.
    pub async fn handle_event(
        &mut self,
        client: &F::Client,
        event: &EngineEvent,
        cancel: &CancellationToken,
    ) -> Result<(), HostSyncError> {
        let container_id = event.container_id.as_str();

        match &event.action {
            EventAction::Start => {
                let details = inspect(client, container_id, cancel).await?;
                self.upsert_all(&details);
            }
            EventAction::Connect => {
                let Some(network) = event.network_name.as_deref() else {
                    return Err(EngineError::InvalidEvent(format!(
                        "connect event for {} has no network name",
                        short_id(container_id)
                    ))
                    .into());
                };
                let details = inspect(client, container_id, cancel).await?;
                match details.ip_on(network) {
                    Some(ip) => {
                        self.table
                            .upsert(&details.id, network, ip, domain_candidates(&details));
                    }
                    None => debug!(
                        container_id = %short_id(container_id),
                        network,
                        "container no longer reports the network"
                    ),
                }
            }
            EventAction::Disconnect => {
                let network = event.network_name.as_deref().unwrap_or_default();
                info!(
                    container_id = %short_id(container_id),
                    network,
                    "removing hosts entry"
                );
                self.table.remove_network(container_id, network);
            }
            EventAction::Die => {
                info!(
                    container_id = %short_id(container_id),
                    "removing hosts entries"
                );
                self.table.remove(container_id);
            }
            EventAction::Other(action) => {
                debug!(
                    container_id = %short_id(container_id),
                    action = %action,
                    "ignoring event"
                );
                return Ok(());
            }
        }

        metrics::counter!(m::EVENTS_HANDLED_TOTAL, m::LABEL_ACTION => event.action.label())
            .increment(1);
        self.flush(cancel).await?;
        Ok(())
    }

    fn upsert_all(&mut self, details: &ContainerDetails) {
        for (network, ip) in &details.networks {
            self.table
                .upsert(&details.id, network, ip, domain_candidates(details));
        }
    }

    /// Renders the current table into the hosts file.
    async fn flush(&self, cancel: &CancellationToken) -> Result<(), HostsFileError> {
        let started = Instant::now();
        let result = self
            .hosts
            .sync(&self.table.snapshot(), &self.writer, cancel)
            .await;
        let outcome = if result.is_ok() { "success" } else { "failure" };

        metrics::histogram!(m::HOSTS_WRITE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::counter!(m::HOSTS_WRITES_TOTAL, m::LABEL_RESULT => outcome).increment(1);
        metrics::gauge!(m::TABLE_CONTAINERS).set(self.table.len() as f64);
        metrics::gauge!(m::TABLE_RECORDS).set(self.table.record_count() as f64);

        result.map(|_| ())
    }

    /// Waits the reconnect delay. Returns `false` if cancelled meanwhile.
    async fn wait_before_reconnect(&mut self, cancel: &CancellationToken) -> bool {
        self.transition(DaemonState::Reconnecting);
        self.connector.mark_disconnected();
        let delay = self.connector.retry_delay();
        info!("reconnecting to container engine in {:?}", delay);

        tokio::select! {
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    fn transition(&mut self, next: DaemonState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "daemon state changed");
            self.state = next;
        }
    }
}

async fn inspect<C: EngineClient>(
    client: &C,
    container_id: &str,
    cancel: &CancellationToken,
) -> Result<ContainerDetails, EngineError> {
    tokio::select! {
        () = cancel.cancelled() => Err(EngineError::Cancelled),
        result = client.inspect_container(container_id) => result,
    }
}
