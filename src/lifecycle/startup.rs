//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the service's store and register it for shutdown
//! - Start background tasks (signals, store health monitor)
//! - Bind the listener and begin accepting traffic
//! - Wait for a complete, bounded drain before returning
//!
//! # Design Decisions
//! - Fail fast: a store or bind error aborts startup
//! - Listener binds last (traffic only when ready)
//! - A listener failure still runs shutdown so the store is closed once

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ServiceConfig;
use crate::health::HealthMonitor;
use crate::http::{Harness, HttpServer};
use crate::lifecycle::inflight::InFlightTracker;
use crate::lifecycle::shutdown::{ShutdownCoordinator, ShutdownTrigger};
use crate::lifecycle::signals::spawn_signal_listener;
use crate::services::ServiceKind;
use crate::store::{self, DocumentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("opening store: {0}")]
    Store(#[from] StoreError),
    #[error("binding {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// A service that is accepting traffic.
pub struct RunningService {
    kind: ServiceKind,
    local_addr: SocketAddr,
    coordinator: Arc<ShutdownCoordinator>,
    in_flight: InFlightTracker,
    server: JoinHandle<()>,
    drain_timeout: Duration,
}

impl RunningService {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.coordinator
    }

    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    /// Block until shutdown has fired and everything drained.
    pub async fn wait(self) {
        self.coordinator.drained().await;
        tracing::info!(service = %self.kind, "All handlers done.");

        let server = self.server;
        let in_flight = self.in_flight;
        let finish = async move {
            if let Err(e) = server.await {
                tracing::error!(error = %e, "HTTP server task failed");
            }
            in_flight.wait_idle().await;
        };
        if tokio::time::timeout(self.drain_timeout, finish).await.is_err() {
            tracing::warn!(
                timeout_secs = self.drain_timeout.as_secs(),
                "Drain timeout elapsed with requests still in flight"
            );
        }
    }
}

/// Bring a service up: store, coordinator, background tasks, listener.
pub async fn start(kind: ServiceKind, config: ServiceConfig) -> Result<RunningService, StartupError> {
    let database = config
        .store
        .database
        .clone()
        .unwrap_or_else(|| kind.default_database().to_string());
    let store = store::open(&config.store, &database).await?;
    start_with_store(kind, config, store).await
}

/// Same as [`start`], on a store the caller already opened.
pub async fn start_with_store(
    kind: ServiceKind,
    config: ServiceConfig,
    store: Arc<dyn DocumentStore>,
) -> Result<RunningService, StartupError> {
    let coordinator = Arc::new(ShutdownCoordinator::new());
    coordinator.register(Arc::clone(&store)).await;

    spawn_signal_listener(Arc::clone(&coordinator));

    if config.health_check.enabled {
        let monitor = HealthMonitor::new(
            Arc::clone(&store),
            Duration::from_secs(config.health_check.interval_secs),
        );
        monitor.spawn(Arc::clone(&coordinator));
    }

    let (listener, local_addr) = match bind_listener(&config.listener.bind_address).await {
        Ok(bound) => bound,
        Err(e) => {
            coordinator.trigger(ShutdownTrigger::Explicit).await;
            return Err(e);
        }
    };

    let in_flight = InFlightTracker::new();
    let harness = Harness::new(in_flight.clone())
        .with_request_timeout(Duration::from_secs(config.timeouts.request_secs));
    let http = HttpServer::new(kind, &config, store, &harness);

    let server = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move {
            if let Err(e) = http.run(listener, coordinator.subscribe()).await {
                tracing::error!(error = %e, "HTTP server failed");
            }
            if !coordinator.is_shutting_down() {
                coordinator.trigger(ShutdownTrigger::ServerExited).await;
            }
        }
    });

    Ok(RunningService {
        kind,
        local_addr,
        coordinator,
        in_flight,
        server,
        drain_timeout: Duration::from_secs(config.shutdown.drain_timeout_secs),
    })
}

async fn bind_listener(address: &str) -> Result<(TcpListener, SocketAddr), StartupError> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })?;
    let local_addr = listener.local_addr()?;
    Ok((listener, local_addr))
}

/// Start a service and block until it has shut down.
pub async fn run(kind: ServiceKind, config: ServiceConfig) -> Result<(), StartupError> {
    start(kind, config).await?.wait().await;
    Ok(())
}
