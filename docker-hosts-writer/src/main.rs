use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use docker_hosts_writer::cli::DaemonCli;
use docker_hosts_writer::logging::init_tracing;
use docker_hosts_writer::metrics_server::install_metrics_recorder;
use docker_hosts_writer::orchestrator::Orchestrator;
use docker_hosts_writer::shutdown::spawn_signal_handler;
use hostsync_core::config::DaemonConfig;
use hostsync_engine::BollardFactory;
use hostsync_hosts_file::HostsFile;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // config file < environment < flags
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::load(path).await,
        None => DaemonConfig::from_env(),
    }
    .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
    cli.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    if cli.validate {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    init_tracing(&config.general)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %config.engine.endpoint,
        hosts_file = %config.hosts.path,
        prefix = %config.hosts.prefix,
        suffix = %config.hosts.suffix,
        "docker-hosts-writer starting"
    );

    if config.metrics.enabled {
        install_metrics_recorder(&config.metrics)?;
    }

    HostsFile::new(&config.hosts.path)
        .ensure_exists()
        .await
        .map_err(|e| anyhow::anyhow!("cannot manage hosts file: {}", e))?;

    let cancel = CancellationToken::new();
    let signals = spawn_signal_handler(cancel.clone());

    let factory = BollardFactory::new(config.engine.connect_timeout_secs);
    let mut orchestrator = Orchestrator::from_config(&config, factory);
    let result = orchestrator.run(&cancel).await;

    cancel.cancel();
    if let Err(e) = signals.await {
        tracing::warn!(error = %e, "signal task did not exit cleanly");
    }

    result.map_err(|e| anyhow::anyhow!("daemon stopped: {}", e))?;
    tracing::info!("docker-hosts-writer shut down");
    Ok(())
}
