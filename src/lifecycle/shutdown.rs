//! Shutdown coordination.
//!
//! # State Machine
//! ```text
//! Running ──first trigger──▶ ShuttingDown (terminal)
//!                │
//!                ├─ log "Shutting down!"
//!                ├─ broadcast (every current and future listener observes it)
//!                ├─ close each critical resource, once
//!                └─ release the resources' drain slots
//! ```
//!
//! Any later trigger, from any source, is a logged no-op.

use std::fmt;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::health::MonitorFailure;
use crate::lifecycle::drain::{DrainBarrier, DrainSlot};
use crate::observability::metrics;

/// Something that must be torn down exactly once when the process shuts down.
#[async_trait]
pub trait CriticalResource: Send + Sync {
    fn name(&self) -> &str;

    async fn close(&self);
}

/// Where a shutdown request came from.
#[derive(Debug)]
pub enum ShutdownTrigger {
    /// An OS termination or interrupt signal.
    Signal(&'static str),
    /// The health monitor lost the store, or crashed while probing it.
    HealthMonitor(MonitorFailure),
    /// The HTTP server stopped without being asked to.
    ServerExited,
    /// Programmatic request (admin tooling, tests, startup failures).
    Explicit,
}

impl ShutdownTrigger {
    /// Short label for metrics.
    pub fn source(&self) -> &'static str {
        match self {
            Self::Signal(_) => "signal",
            Self::HealthMonitor(MonitorFailure::ProbeFailed { .. }) => "probe_failure",
            Self::HealthMonitor(MonitorFailure::Panicked { .. }) => "monitor_panic",
            Self::ServerExited => "server_exit",
            Self::Explicit => "explicit",
        }
    }
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(name) => write!(f, "OS signal {name}"),
            Self::HealthMonitor(failure) => write!(f, "health monitor: {failure}"),
            Self::ServerExited => write!(f, "HTTP server exited unexpectedly"),
            Self::Explicit => write!(f, "explicit request"),
        }
    }
}

struct RegisteredResource {
    resource: Box<dyn CriticalResource>,
    _slot: DrainSlot,
}

/// Single authority deciding that the process is shutting down.
///
/// Created once by the composition root and shared behind an `Arc` with the
/// signal listener, the health monitor and the HTTP server.
pub struct ShutdownCoordinator {
    /// Set exactly once, by the winning trigger. Doubles as the shutdown flag.
    fired_by: OnceLock<String>,
    tx: watch::Sender<bool>,
    drain: DrainBarrier,
    resources: Mutex<Vec<RegisteredResource>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            fired_by: OnceLock::new(),
            tx,
            drain: DrainBarrier::new(),
            resources: Mutex::new(Vec::new()),
        }
    }

    /// Register a resource to close on shutdown. It holds a drain slot until
    /// closed. If shutdown already fired, the resource is closed right away.
    pub async fn register<R>(&self, resource: R)
    where
        R: CriticalResource + 'static,
    {
        let late = {
            let mut resources = self.lock_resources();
            if self.is_shutting_down() {
                Some(resource)
            } else {
                let slot = self.drain.enlist(resource.name().to_string());
                resources.push(RegisteredResource {
                    resource: Box::new(resource),
                    _slot: slot,
                });
                None
            }
        };

        if let Some(resource) = late {
            tracing::warn!(
                resource = resource.name(),
                "Resource registered after shutdown, closing immediately"
            );
            resource.close().await;
        }
    }

    /// Enlist a long-lived task in the drain barrier.
    pub fn drain_slot(&self, participant: impl Into<String>) -> DrainSlot {
        self.drain.enlist(participant)
    }

    /// Subscribe to the shutdown broadcast.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Wait for the shutdown broadcast.
    pub async fn wait(&self) {
        self.subscribe().recv().await;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.fired_by.get().is_some()
    }

    /// Description of the trigger that won, once shutdown has fired.
    pub fn fired_by(&self) -> Option<&str> {
        self.fired_by.get().map(String::as_str)
    }

    /// Number of drain participants still outstanding.
    pub fn pending(&self) -> usize {
        self.drain.pending()
    }

    /// Wait until every critical resource is closed and every enlisted task
    /// has finished.
    pub async fn drained(&self) {
        self.drain.drained().await;
    }

    /// Begin shutdown. Returns `true` for the single call that performed the
    /// transition and `false` for every redundant call.
    pub async fn trigger(&self, trigger: ShutdownTrigger) -> bool {
        let source = trigger.source();
        let description = trigger.to_string();
        if let Err(description) = self.fired_by.set(description) {
            tracing::warn!(
                trigger = %description,
                fired_by = self.fired_by().unwrap_or_default(),
                "Redundant shutdown trigger ignored"
            );
            metrics::record_shutdown_trigger(source, false);
            return false;
        }

        tracing::warn!(trigger = self.fired_by().unwrap_or_default(), "Shutting down!");
        metrics::record_shutdown_trigger(source, true);

        self.tx.send_replace(true);

        let resources = std::mem::take(&mut *self.lock_resources());
        for registered in resources {
            registered.resource.close().await;
            tracing::info!(resource = registered.resource.name(), "Critical resource closed");
        }

        tracing::info!(pending = self.pending(), "Waiting for handlers to exit");
        true
    }

    fn lock_resources(&self) -> MutexGuard<'_, Vec<RegisteredResource>> {
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the shutdown broadcast.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once shutdown has fired. Returns immediately for listeners
    /// subscribed after the fact, and if the coordinator is gone.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|fired| *fired).await;
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.rx.borrow()
    }
}
