//! Signal handling.
//!
//! A single task waits for SIGTERM/SIGINT (Ctrl-C elsewhere) and cancels
//! the daemon's [`CancellationToken`].

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl-C handler: {}", e))?;
    Ok("Ctrl-C")
}

/// Spawns the signal task.
///
/// The token is cancelled on the first signal. If the handlers cannot be
/// installed the token is cancelled too, so the daemon never runs without a
/// way to stop it.
pub fn spawn_signal_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            signal = wait_for_shutdown_signal() => {
                match signal {
                    Ok(name) => tracing::info!(signal = name, "shutdown signal received"),
                    Err(e) => tracing::error!(error = %e, "signal handling unavailable, shutting down"),
                }
                cancel.cancel();
            }
        }
    })
}
