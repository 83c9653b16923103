//! Reservation endpoint handlers.

use axum::http::StatusCode;

use crate::http::{ApiRequest, CorrelationContext, Outcome, ServiceError};
use crate::services::reservation::models::{ReservationDetails, RESERVATIONS};
use crate::services::{reject_invalid, ServiceState};
use crate::store::{Document, Filter};

pub async fn hello(_: ServiceState, _: ApiRequest, _: CorrelationContext) -> Outcome {
    Outcome::success(StatusCode::OK, "It's-a-me Mario.")
}

pub async fn add_reservation(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let details: ReservationDetails = match request.json() {
        Ok(details) => details,
        Err(e) => {
            tracing::debug!(error = %e, "Undecodable reservation body");
            return Ok(Outcome::bad_request("BadRequest: Invalid request body."));
        }
    };
    if let Some(rejection) = reject_invalid(&details) {
        return Ok(rejection);
    }

    tracing::info!(reservation_id = %details.reservation_id, "Inserting reservation document");
    state
        .store
        .insert(RESERVATIONS, serde_json::to_value(&details)?)
        .await?;
    Ok(Outcome::json(StatusCode::OK, &details))
}

pub async fn get_reservation(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let reservation_id = request.param("reservationId");
    tracing::info!(reservation_id, "Querying for reservation");

    let filter = Filter::all().eq("reservationId", reservation_id);
    let found = state.store.find(RESERVATIONS, &filter).await?.into_iter().next();
    match found {
        Some(document) => {
            tracing::info!(reservation_id, "Reservation found");
            Ok(Outcome::json(StatusCode::OK, &to_details(document)?))
        }
        None => {
            tracing::error!(reservation_id, "No reservation found");
            Ok(Outcome::bad_request(format!(
                "BadRequest: No reservation found for reservationId: {reservation_id}"
            )))
        }
    }
}

pub async fn all_reservations(
    state: ServiceState,
    _request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    tracing::info!("Getting all reservations");
    let reservations = list(&state, &Filter::all()).await?;
    tracing::info!(count = reservations.len(), "Returning reservations");
    Ok(Outcome::json(StatusCode::OK, &reservations))
}

pub async fn user_reservations(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let user_id = request.param("userId");
    let reservations = list(&state, &Filter::all().eq("userId", user_id)).await?;
    tracing::info!(user_id, count = reservations.len(), "Found reservations for user");
    Ok(Outcome::json(StatusCode::OK, &reservations))
}

async fn list(state: &ServiceState, filter: &Filter) -> Result<Vec<ReservationDetails>, ServiceError> {
    state
        .store
        .find(RESERVATIONS, filter)
        .await?
        .into_iter()
        .map(to_details)
        .collect()
}

fn to_details(document: Document) -> Result<ReservationDetails, ServiceError> {
    Ok(serde_json::from_value(document.body)?)
}
