//! The two bike-sharing services built on the request harness.
//!
//! # Data Flow
//! ```text
//! ServiceKind::routes(&Harness)
//!     → billing::routes      (invoices, customers, vendors)
//!     → reservation::routes  (reservation documents)
//!     → Router<ServiceState> (store injected by HttpServer)
//! ```

pub mod billing;
pub mod reservation;

use std::fmt;
use std::sync::Arc;

use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::http::{Harness, Outcome};
use crate::store::{Document, DocumentStore};

/// Which service this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceKind {
    Billing,
    Reservation,
}

impl ServiceKind {
    /// Name used in startup and shutdown log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Billing => "Billing",
            Self::Reservation => "Reservation",
        }
    }

    /// Logical database used when the configuration names none.
    pub fn default_database(&self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Reservation => "resdb",
        }
    }

    pub fn routes(&self, harness: &Harness) -> Router<ServiceState> {
        match self {
            Self::Billing => billing::routes(harness),
            Self::Reservation => reservation::routes(harness),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Billing => f.write_str("billing"),
            Self::Reservation => f.write_str("reservation"),
        }
    }
}

/// Shared state handed to every business handler.
#[derive(Clone)]
pub struct ServiceState {
    pub store: Arc<dyn DocumentStore>,
}

/// Field-level checks on an inbound entity.
pub trait Validate {
    /// Every violated rule, in a stable order. Empty when valid.
    fn violations(&self) -> Vec<&'static str>;
}

/// 400 carrying the violations as a JSON array of strings, or `None` if valid.
pub(crate) fn reject_invalid<T: Validate>(entity: &T) -> Option<Outcome> {
    let violations = entity.violations();
    if violations.is_empty() {
        return None;
    }
    Some(match serde_json::to_string(&violations) {
        Ok(message) => Outcome::bad_request(message),
        Err(e) => Outcome::unexpected(e),
    })
}

/// Serialize an entity as a stored document body, without its `id` field.
pub(crate) fn to_body<T: Serialize>(entity: &T) -> Result<Value, serde_json::Error> {
    let mut body = serde_json::to_value(entity)?;
    if let Some(fields) = body.as_object_mut() {
        fields.remove("id");
    }
    Ok(body)
}

/// Rebuild an entity from a stored document, filling `id` from the store.
pub(crate) fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, serde_json::Error> {
    let mut body = document.body;
    if let Some(fields) = body.as_object_mut() {
        fields.insert("id".to_string(), Value::String(document.id));
    }
    serde_json::from_value(body)
}
