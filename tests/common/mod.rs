//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use bikeshare_services::http::Harness;
use bikeshare_services::lifecycle::InFlightTracker;
use bikeshare_services::store::{DocumentStore, MemoryStore};
use bikeshare_services::{HttpServer, ServiceConfig, ServiceKind};

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's tracing output into a [`LogCapture`] until the guard drops.
/// Pair with a current-thread runtime so spawned tasks log to the same place.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

/// Config bound to an ephemeral local port with the monitor off.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.health_check.enabled = false;
    config.shutdown.drain_timeout_secs = 5;
    config
}

/// Fully layered router for `kind` over a fresh memory store.
pub fn service_router(kind: ServiceKind) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(kind.default_database()));
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let config = test_config();
    let harness = Harness::new(InFlightTracker::new())
        .with_request_timeout(Duration::from_secs(config.timeouts.request_secs));
    let server = HttpServer::new(kind, &config, dyn_store, &harness);
    (server.router(), store)
}

/// Send one request through `router` and collect status and body text.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
