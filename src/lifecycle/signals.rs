//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGTERM, SIGINT and SIGQUIT (Ctrl+C off unix)
//! - Turn the first one into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The listener stops once shutdown fired from any other source

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{ShutdownCoordinator, ShutdownTrigger};

/// Spawn the task that converts OS signals into a shutdown trigger.
pub fn spawn_signal_listener(coordinator: Arc<ShutdownCoordinator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut shutdown = coordinator.subscribe();
        tokio::select! {
            received = wait_for_signal() => match received {
                Ok(name) => {
                    tracing::error!(signal = name, "OS signal received");
                    coordinator.trigger(ShutdownTrigger::Signal(name)).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install signal handlers");
                }
            },
            () = shutdown.recv() => {
                tracing::debug!("Signal listener stopping");
            }
        }
    })
}

/// Wait for a termination signal and return its name.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
