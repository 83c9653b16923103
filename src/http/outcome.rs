//! Handler outcomes and their mapping onto HTTP responses.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::store::StoreError;

/// Failures a handler did not expect. Surfaced as 500 with the message.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("serializing response: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Internal(String),
}

/// Result a business handler hands back to the harness.
#[derive(Debug)]
pub enum Outcome {
    Success { status: StatusCode, body: String },
    Failure { status: StatusCode, message: String },
    Unexpected(ServiceError),
}

impl Outcome {
    pub fn success(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Success {
            status,
            body: body.into(),
        }
    }

    /// Serialize `value` as the body; a serialization error becomes `Unexpected`.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::success(status, body),
            Err(e) => Self::Unexpected(e.into()),
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Failure {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::failure(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failure(StatusCode::NOT_FOUND, message)
    }

    pub fn unexpected(error: impl Into<ServiceError>) -> Self {
        Self::Unexpected(error.into())
    }

    /// Describes why this outcome cannot be trusted, if it is malformed.
    pub fn defect(&self) -> Option<String> {
        match self {
            Self::Success { status, .. } if status.is_client_error() || status.is_server_error() => {
                Some(format!("success outcome carries error status {status}"))
            }
            Self::Success { status, .. } if status.is_informational() => {
                Some(format!("success outcome carries informational status {status}"))
            }
            Self::Failure { status, .. }
                if !(status.is_client_error() || status.is_server_error()) =>
            {
                Some(format!("failure outcome carries non-error status {status}"))
            }
            _ => None,
        }
    }
}

impl From<Result<Outcome, ServiceError>> for Outcome {
    fn from(result: Result<Outcome, ServiceError>) -> Self {
        result.unwrap_or_else(Self::Unexpected)
    }
}

/// Build the response for a status and text payload. Non-empty payloads are
/// newline-terminated.
pub(crate) fn write_response(status: StatusCode, text: &str) -> Result<Response, axum::http::Error> {
    let builder = Response::builder().status(status);
    if text.is_empty() {
        return builder.body(Body::empty());
    }
    builder
        .header(header::CONTENT_TYPE, content_type_for(text))
        .body(Body::from(format!("{text}\n")))
}

/// Fallback when the real response could not be produced.
pub(crate) fn internal_error_response() -> Response {
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

fn content_type_for(text: &str) -> &'static str {
    let looks_like_json = serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
        && matches!(text.trim_start().as_bytes().first(), Some(b'{' | b'['));
    if looks_like_json {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    }
}
