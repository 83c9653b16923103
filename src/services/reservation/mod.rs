//! Reservation service: stores and serves bike reservations.
//!
//! The correlation header is accepted but never required here.

pub mod handlers;
pub mod models;

use axum::Router;

use crate::http::CorrelationRequirement::Optional;
use crate::http::Harness;
use crate::services::ServiceState;

use handlers::*;

pub fn routes(harness: &Harness) -> Router<ServiceState> {
    Router::new()
        .route("/hello", harness.get(Optional, hello))
        .route("/api/allReservations", harness.get(Optional, all_reservations))
        .route("/api/reservation", harness.post(Optional, add_reservation))
        .route(
            "/api/reservation/{reservationId}",
            harness.get(Optional, get_reservation),
        )
        .route(
            "/api/user/{userId}/reservations",
            harness.get(Optional, user_reservations),
        )
}
