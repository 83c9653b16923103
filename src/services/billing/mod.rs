//! Billing service: invoices, customers and vendors.
//!
//! Every endpoint except `/hello` requires the correlation header.

pub mod handlers;
pub mod models;

use axum::Router;

use crate::http::CorrelationRequirement::{Optional, Required};
use crate::http::Harness;
use crate::services::ServiceState;

use handlers::*;
use models::{Customer, Vendor};

pub fn routes(harness: &Harness) -> Router<ServiceState> {
    Router::new()
        .route("/hello", harness.get(Optional, hello))
        .route("/api/invoice", harness.post(Required, new_invoice))
        .route("/api/invoice/{id}", harness.get(Required, get_invoice))
        .route(
            "/api/customer",
            harness
                .post(Required, new_account::<Customer>)
                .merge(harness.patch(Required, update_account::<Customer>)),
        )
        .route("/api/customer/{userID}", harness.get(Required, get_account::<Customer>))
        .route(
            "/api/customer/{userID}/invoices",
            harness.get(Required, customer_invoices),
        )
        .route(
            "/api/vendor",
            harness
                .post(Required, new_account::<Vendor>)
                .merge(harness.patch(Required, update_account::<Vendor>)),
        )
        .route("/api/vendor/{userID}", harness.get(Required, get_account::<Vendor>))
        .route(
            "/api/vendor/{userID}/invoices",
            harness.get(Required, vendor_invoices),
        )
        .route(
            "/api/reservation/{resID}/invoice",
            harness.get(Required, invoice_for_reservation),
        )
}
