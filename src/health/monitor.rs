//! Store liveness monitoring.
//!
//! # Responsibilities
//! - Periodically probe the document store
//! - Convert a failed probe, or a panic anywhere in the loop, into one
//!   shutdown trigger
//! - Stop polling as soon as shutdown fired from any source

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::lifecycle::drain::DrainSlot;
use crate::lifecycle::shutdown::{ShutdownCoordinator, ShutdownListener, ShutdownTrigger};
use crate::observability::metrics;
use crate::store::{DocumentStore, StoreError};

/// Liveness check against an external resource.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> Probe for S {
    fn name(&self) -> &str {
        DocumentStore::name(self)
    }

    async fn probe(&self) -> Result<(), StoreError> {
        DocumentStore::probe(self).await
    }
}

/// Why the monitor gave up on its resource.
#[derive(Debug, thiserror::Error)]
pub enum MonitorFailure {
    #[error("'{resource}' liveness probe failed: {source}")]
    ProbeFailed {
        resource: String,
        #[source]
        source: StoreError,
    },
    #[error("panic while probing '{resource}': {message}")]
    Panicked { resource: String, message: String },
}

/// Background loop polling a [`Probe`] on a fixed interval.
pub struct HealthMonitor<P: ?Sized> {
    probe: Arc<P>,
    interval: Duration,
}

impl<P: Probe + ?Sized> HealthMonitor<P> {
    pub fn new(probe: Arc<P>, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// Spawn the loop. It runs until shutdown fires or the resource fails;
    /// the first probe happens one full interval after start.
    ///
    /// The drain slot is taken before this returns, so the process cannot
    /// drain past a monitor that has not been polled yet.
    pub fn spawn(self, coordinator: Arc<ShutdownCoordinator>) -> JoinHandle<()>
    where
        P: 'static,
    {
        let slot = coordinator.drain_slot("health-monitor");
        tokio::spawn(self.run(slot, coordinator))
    }

    async fn run(self, _slot: DrainSlot, coordinator: Arc<ShutdownCoordinator>) {
        let mut shutdown = coordinator.subscribe();
        let resource = self.probe.name().to_string();

        tracing::info!(
            resource = %resource,
            interval_ms = self.interval.as_millis() as u64,
            "Health monitor starting"
        );

        let exit = AssertUnwindSafe(self.poll(&mut shutdown))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(MonitorFailure::Panicked {
                    resource: resource.clone(),
                    message: panic_message(panic.as_ref()),
                })
            });

        match exit {
            Ok(()) => tracing::info!(resource = %resource, "Health monitor graceful shutdown"),
            Err(failure) if coordinator.is_shutting_down() => {
                tracing::debug!(
                    resource = %resource,
                    error = %failure,
                    "Ignoring monitor failure during shutdown"
                );
            }
            Err(failure) => {
                tracing::error!(resource = %resource, error = %failure, "Store shut down unexpectedly!");
                coordinator
                    .trigger(ShutdownTrigger::HealthMonitor(failure))
                    .await;
            }
        }
    }

    async fn poll(&self, shutdown: &mut ShutdownListener) -> Result<(), MonitorFailure> {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.recv() => return Ok(()),
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                () = shutdown.recv() => return Ok(()),
                result = self.probe.probe() => result,
            };

            if let Err(source) = result {
                metrics::record_probe_failure(self.probe.name());
                return Err(MonitorFailure::ProbeFailed {
                    resource: self.probe.name().to_string(),
                    source,
                });
            }
            tracing::trace!(resource = self.probe.name(), "Probe ok");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds until call number `fail_on`, then fails or panics.
    struct ScriptedProbe {
        calls: AtomicUsize,
        fail_on: usize,
        panic: bool,
    }

    impl ScriptedProbe {
        fn failing_on(fail_on: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_on,
                panic: false,
            })
        }

        fn panicking_on(fail_on: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_on,
                panic: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn probe(&self) -> Result<(), StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call < self.fail_on {
                return Ok(());
            }
            if self.panic {
                panic!("probe exploded on call {call}");
            }
            Err(StoreError::Unreachable("scripted".into()))
        }
    }

    const INTERVAL: Duration = Duration::from_secs(3);

    #[tokio::test(start_paused = true)]
    async fn fires_after_exactly_three_intervals() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let probe = ScriptedProbe::failing_on(3);
        let started = Instant::now();

        let monitor =
            HealthMonitor::new(Arc::clone(&probe), INTERVAL).spawn(Arc::clone(&coordinator));

        coordinator.wait().await;

        assert_eq!(started.elapsed(), INTERVAL * 3);
        assert_eq!(probe.calls(), 3);
        monitor.await.unwrap();
        assert!(coordinator.fired_by().unwrap().contains("liveness probe failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_fire_before_the_failing_probe() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let probe = ScriptedProbe::failing_on(3);

        let _monitor =
            HealthMonitor::new(Arc::clone(&probe), INTERVAL).spawn(Arc::clone(&coordinator));

        time::sleep(INTERVAL * 3 - Duration::from_millis(1)).await;
        assert_eq!(probe.calls(), 2);
        assert!(!coordinator.is_shutting_down());
    }

    #[tokio::test(start_paused = true)]
    async fn panic_in_probe_becomes_a_shutdown_trigger() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let probe = ScriptedProbe::panicking_on(2);

        let monitor =
            HealthMonitor::new(Arc::clone(&probe), INTERVAL).spawn(Arc::clone(&coordinator));

        coordinator.wait().await;
        monitor.await.unwrap();

        let fired_by = coordinator.fired_by().unwrap();
        assert!(fired_by.contains("panic while probing 'scripted'"));
        assert!(fired_by.contains("probe exploded on call 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_promptly_when_shutdown_comes_from_elsewhere() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let probe = ScriptedProbe::failing_on(usize::MAX);

        let monitor =
            HealthMonitor::new(Arc::clone(&probe), INTERVAL).spawn(Arc::clone(&coordinator));
        time::sleep(INTERVAL + Duration::from_millis(1)).await;
        assert_eq!(probe.calls(), 1);

        let started = Instant::now();
        coordinator.trigger(ShutdownTrigger::Explicit).await;
        monitor.await.unwrap();

        assert!(started.elapsed() < INTERVAL);
        assert_eq!(probe.calls(), 1);
        coordinator.drained().await;
    }
}
