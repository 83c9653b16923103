//! Per-request correlation identity.
//!
//! # Responsibilities
//! - Parse the inbound `x-contoso-request-id` header as a UUID
//! - Reject requests without a usable id on endpoints that require one
//! - Render "no id" distinctly from the nil UUID in log lines

use std::fmt;

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header carrying the caller's request identifier.
pub const REQUEST_ID_HEADER: &str = "x-contoso-request-id";

/// Whether an endpoint insists on a correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationRequirement {
    Required,
    Optional,
}

/// Request identifier as seen in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestId {
    Provided(Uuid),
    /// Endpoint did not require an id and none usable was sent.
    Absent,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provided(id) => id.fmt(f),
            Self::Absent => f.write_str("<none>"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CorrelationError {
    #[error("Couldn't parse {} header: header is missing", REQUEST_ID_HEADER)]
    Missing,
    #[error("Couldn't parse {} header: value is not valid text", REQUEST_ID_HEADER)]
    NotText,
    #[error("Couldn't parse {} header: {source}", REQUEST_ID_HEADER)]
    Invalid {
        #[source]
        source: uuid::Error,
    },
}

/// Immutable identity of one request. Created by the harness, handed to the
/// handler, dropped with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationContext {
    request_id: RequestId,
}

impl CorrelationContext {
    pub fn from_headers(
        headers: &HeaderMap,
        requirement: CorrelationRequirement,
    ) -> Result<Self, CorrelationError> {
        match (parse_header(headers), requirement) {
            (Ok(id), _) => Ok(Self {
                request_id: RequestId::Provided(id),
            }),
            (Err(_), CorrelationRequirement::Optional) => Ok(Self::absent()),
            (Err(e), CorrelationRequirement::Required) => Err(e),
        }
    }

    pub fn absent() -> Self {
        Self {
            request_id: RequestId::Absent,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Span every request-scoped log line is emitted under.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("request", request_id = %self.request_id)
    }
}

fn parse_header(headers: &HeaderMap) -> Result<Uuid, CorrelationError> {
    let value = headers
        .get(REQUEST_ID_HEADER)
        .ok_or(CorrelationError::Missing)?
        .to_str()
        .map_err(|_| CorrelationError::NotText)?;
    Uuid::parse_str(value.trim()).map_err(|source| CorrelationError::Invalid { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_hyphenated_and_simple_forms() {
        let id = Uuid::new_v4();
        for text in [id.hyphenated().to_string(), id.simple().to_string()] {
            let ctx =
                CorrelationContext::from_headers(&headers(&text), CorrelationRequirement::Required)
                    .unwrap();
            assert_eq!(ctx.request_id(), RequestId::Provided(id));
        }
    }

    #[test]
    fn required_header_missing_or_garbage_is_rejected() {
        let missing =
            CorrelationContext::from_headers(&HeaderMap::new(), CorrelationRequirement::Required)
                .unwrap_err();
        assert!(matches!(missing, CorrelationError::Missing));
        assert!(missing.to_string().contains(REQUEST_ID_HEADER));

        let garbage =
            CorrelationContext::from_headers(&headers("abc"), CorrelationRequirement::Required)
                .unwrap_err();
        assert!(matches!(garbage, CorrelationError::Invalid { .. }));
    }

    #[test]
    fn optional_header_falls_back_to_placeholder() {
        let ctx =
            CorrelationContext::from_headers(&headers("abc"), CorrelationRequirement::Optional)
                .unwrap();
        assert_eq!(ctx.request_id(), RequestId::Absent);
        assert_eq!(ctx.request_id().to_string(), "<none>");
    }

    #[test]
    fn nil_uuid_is_not_confused_with_absent() {
        let ctx = CorrelationContext::from_headers(
            &headers("00000000-0000-0000-0000-000000000000"),
            CorrelationRequirement::Required,
        )
        .unwrap();
        assert_eq!(
            ctx.request_id().to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
        assert_ne!(ctx.request_id(), RequestId::Absent);
    }
}
