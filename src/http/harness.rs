//! Request lifecycle harness.
//!
//! # Data Flow
//! ```text
//! axum route
//!     → CorrelationContext::from_headers (400 on a required, unusable header)
//!     → read body, collect path params
//!     → ApiHandler::call inside the request span → Outcome
//!       (408 once the request timeout elapses)
//!     → defect check (fatal hook on a malformed Outcome)
//!     → Outcome → Response (bare 500 if that fails)
//!     → RecordedBody streams the payload out
//!     → RequestRecorder logs + meters the request exactly once, after the
//!       body is sent (500 if transmission fails or is cut short)
//! ```
//!
//! Handlers never see the response; they only return an [`Outcome`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::{self, Body, Bytes};
use axum::extract::{FromRequestParts, RawPathParams, Request, State};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use axum::routing::{self, MethodFilter, MethodRouter};
use futures_util::future::{FutureExt, MapInto};
use http_body::{Body as HttpBody, Frame, SizeHint};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::http::correlation::{CorrelationContext, CorrelationRequirement, RequestId};
use crate::http::outcome::{internal_error_response, write_response, Outcome};
use crate::lifecycle::InFlightTracker;
use crate::observability::metrics;

/// Invoked on a programming defect. Never returns.
pub type FatalHook = fn(&str) -> !;

fn abort_process(defect: &str) -> ! {
    tracing::error!(defect, "Handler returned a malformed outcome, aborting");
    std::process::abort()
}

/// What a business handler gets to see of the HTTP request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub body: Bytes,
}

impl ApiRequest {
    /// Captured path parameter, or `""` when the route has none by that name.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A business handler: `(state, request, context) -> Outcome`.
///
/// Implemented for every async fn or closure of that shape whose output
/// converts into an [`Outcome`], including `Result<Outcome, ServiceError>`.
pub trait ApiHandler<S>: Send + Sync + 'static {
    type Future: Future<Output = Outcome> + Send;

    fn call(&self, state: S, request: ApiRequest, ctx: CorrelationContext) -> Self::Future;
}

impl<S, F, Fut> ApiHandler<S> for F
where
    F: Fn(S, ApiRequest, CorrelationContext) -> Fut + Send + Sync + 'static,
    Fut: Future + Send,
    Fut::Output: Into<Outcome>,
{
    type Future = MapInto<Fut, Outcome>;

    fn call(&self, state: S, request: ApiRequest, ctx: CorrelationContext) -> Self::Future {
        self(state, request, ctx).map_into()
    }
}

/// Wraps business handlers into axum routes.
#[derive(Clone)]
pub struct Harness {
    in_flight: InFlightTracker,
    fatal: FatalHook,
    request_timeout: Option<Duration>,
}

impl Harness {
    pub fn new(in_flight: InFlightTracker) -> Self {
        Self {
            in_flight,
            fatal: abort_process,
            request_timeout: None,
        }
    }

    /// Answer 408 when a handler has not produced an outcome within `limit`.
    pub fn with_request_timeout(mut self, limit: Duration) -> Self {
        self.request_timeout = Some(limit);
        self
    }

    /// Replace the defect hook (tests install one that panics).
    pub fn with_fatal_hook(mut self, fatal: FatalHook) -> Self {
        self.fatal = fatal;
        self
    }

    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    pub fn get<S, H>(&self, requirement: CorrelationRequirement, handler: H) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
        H: ApiHandler<S>,
    {
        self.on(MethodFilter::GET, requirement, handler)
    }

    pub fn post<S, H>(&self, requirement: CorrelationRequirement, handler: H) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
        H: ApiHandler<S>,
    {
        self.on(MethodFilter::POST, requirement, handler)
    }

    pub fn patch<S, H>(&self, requirement: CorrelationRequirement, handler: H) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
        H: ApiHandler<S>,
    {
        self.on(MethodFilter::PATCH, requirement, handler)
    }

    fn on<S, H>(
        &self,
        filter: MethodFilter,
        requirement: CorrelationRequirement,
        handler: H,
    ) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
        H: ApiHandler<S>,
    {
        let endpoint = Arc::new(Endpoint {
            harness: self.clone(),
            requirement,
            handler,
        });
        routing::on(filter, move |State(state): State<S>, request: Request| {
            let endpoint = Arc::clone(&endpoint);
            async move { endpoint.execute(state, request).await }
        })
    }
}

struct Endpoint<H> {
    harness: Harness,
    requirement: CorrelationRequirement,
    handler: H,
}

impl<H> Endpoint<H> {
    async fn execute<S>(&self, state: S, request: Request) -> Response
    where
        H: ApiHandler<S>,
    {
        let _in_flight = self.harness.in_flight.track();
        let (mut parts, body) = request.into_parts();
        let mut recorder = RequestRecorder::start(parts.method.clone(), parts.uri.path());

        let ctx = match CorrelationContext::from_headers(&parts.headers, self.requirement) {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::info!(path = %parts.uri.path(), error = %e, "Rejected request without usable correlation id");
                return recorder.respond(StatusCode::BAD_REQUEST, &e.to_string());
            }
        };
        recorder.request_id = ctx.request_id();

        let params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            Err(rejection) => {
                return recorder.respond(StatusCode::BAD_REQUEST, &rejection.body_text());
            }
        };

        let body = match body::to_bytes(body, usize::MAX).await {
            Ok(body) => body,
            Err(e) => {
                let message = format!("Couldn't read request body: {e}");
                return recorder.respond(StatusCode::BAD_REQUEST, &message);
            }
        };

        let request = ApiRequest {
            method: parts.method,
            path: parts.uri.path().to_string(),
            params,
            body,
        };
        let span = ctx.span();
        let call = self.handler.call(state, request, ctx).instrument(span.clone());
        let outcome = match self.harness.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(parent: &span, timeout_ms = limit.as_millis() as u64, "Handler timed out");
                    Outcome::failure(StatusCode::REQUEST_TIMEOUT, "Request timed out")
                }
            },
            None => call.await,
        };

        let _entered = span.enter();
        if let Some(defect) = outcome.defect() {
            tracing::error!(defect = %defect, "Malformed handler outcome");
            recorder.status = Some(StatusCode::INTERNAL_SERVER_ERROR);
            drop(recorder);
            (self.harness.fatal)(&defect);
        }

        let (status, text) = match outcome {
            Outcome::Success { status, body } => (status, body),
            Outcome::Failure { status, message } => {
                tracing::debug!(status = status.as_u16(), message = %message, "Request failed");
                (status, message)
            }
            Outcome::Unexpected(cause) => {
                tracing::error!(error = %cause, "Unexpected error handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, cause.to_string())
            }
        };
        recorder.respond(status, &text)
    }
}

/// Logs and meters one request when dropped, whichever way the request ends.
///
/// Once a response exists the recorder rides inside its [`RecordedBody`], so
/// the log line reflects whether the payload actually went out.
struct RequestRecorder {
    method: Method,
    path: String,
    started: Instant,
    request_id: RequestId,
    status: Option<StatusCode>,
}

impl RequestRecorder {
    fn start(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            started: Instant::now(),
            request_id: RequestId::Absent,
            status: None,
        }
    }

    fn respond(mut self, status: StatusCode, text: &str) -> Response {
        let response = match write_response(status, text) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(request_id = %self.request_id, error = %e, "Failed to write response");
                internal_error_response()
            }
        };
        self.status = Some(response.status());
        response.map(|inner| {
            Body::new(RecordedBody {
                inner,
                recorder: Some(self),
            })
        })
    }
}

impl Drop for RequestRecorder {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        match self.status {
            Some(status) => {
                tracing::info!(
                    method = %self.method,
                    path = %self.path,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    status = status.as_u16(),
                    request_id = %self.request_id,
                    "request completed"
                );
                metrics::record_request(self.method.as_str(), status.as_u16(), elapsed);
            }
            None => {
                tracing::warn!(
                    method = %self.method,
                    path = %self.path,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    request_id = %self.request_id,
                    "request aborted before a response was produced"
                );
            }
        }
    }
}

/// Response body that settles its request's log entry when transmission ends.
struct RecordedBody {
    inner: Body,
    recorder: Option<RequestRecorder>,
}

impl RecordedBody {
    fn fail(&mut self, reason: &str) {
        if let Some(mut recorder) = self.recorder.take() {
            tracing::error!(
                request_id = %recorder.request_id,
                intended_status = recorder.status.map(|s| s.as_u16()),
                reason,
                "Failed to send response body"
            );
            recorder.status = Some(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

impl HttpBody for RecordedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => drop(this.recorder.take()),
            Poll::Ready(Some(Err(e))) => this.fail(&e.to_string()),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for RecordedBody {
    fn drop(&mut self) {
        if !self.inner.is_end_stream() {
            self.fail("connection closed before the body was sent");
        }
    }
}
