//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the selected service
//! - Wire up middleware (tracing, body limits)
//! - Serve until the shutdown broadcast fires, then finish in-flight requests

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::harness::Harness;
use crate::lifecycle::ShutdownListener;
use crate::services::{ServiceKind, ServiceState};
use crate::store::DocumentStore;

/// HTTP server for one service.
pub struct HttpServer {
    kind: ServiceKind,
    router: Router,
}

impl HttpServer {
    pub fn new(
        kind: ServiceKind,
        config: &ServiceConfig,
        store: Arc<dyn DocumentStore>,
        harness: &Harness,
    ) -> Self {
        let state = ServiceState { store };
        let router = Self::build_router(config, kind.routes(harness).with_state(state));
        Self { kind, router }
    }

    /// Apply the middleware stack. Request timeouts are enforced by the
    /// harness so a timed-out request still gets its own log entry.
    fn build_router(config: &ServiceConfig, routes: Router) -> Router {
        routes
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then let open requests finish.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(service = %self.kind, address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!(service = %self.kind, "HTTP server stopped");
        Ok(())
    }
}
