//! Billing endpoint handlers.

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::http::{ApiRequest, CorrelationContext, Outcome, ServiceError};
use crate::services::billing::models::{
    Customer, HelloResponse, Invoice, Vendor, CUSTOMERS, INVOICES, VENDORS,
};
use crate::services::{from_document, reject_invalid, to_body, ServiceState, Validate};
use crate::store::{Document, DocumentStore, Filter};

/// Customers and vendors: entities keyed by the owning user.
pub trait Account: Serialize + DeserializeOwned + Validate + Send + Sync {
    const COLLECTION: &'static str;
    const LABEL: &'static str;

    fn user_id(&self) -> &str;
}

impl Account for Customer {
    const COLLECTION: &'static str = CUSTOMERS;
    const LABEL: &'static str = "customer";

    fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Account for Vendor {
    const COLLECTION: &'static str = VENDORS;
    const LABEL: &'static str = "vendor";

    fn user_id(&self) -> &str {
        &self.user_id
    }
}

pub async fn hello(_: ServiceState, _: ApiRequest, _: CorrelationContext) -> Outcome {
    Outcome::json(StatusCode::OK, &HelloResponse { status: "Hello!" })
}

pub async fn new_invoice(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let invoice: Invoice = match request.json() {
        Ok(invoice) => invoice,
        Err(e) => return Ok(Outcome::bad_request(e.to_string())),
    };
    if let Some(rejection) = reject_invalid(&invoice) {
        return Ok(rejection);
    }

    tracing::info!(reservation_id = %invoice.reservation_id, "Adding invoice for reservation");
    let body = to_body(&invoice)?;
    let id = state.store.insert(INVOICES, body.clone()).await?;
    tracing::info!(invoice_id = %id, "Added invoice to store, processing payment");
    tracing::info!("Payment processing done");

    let invoice: Invoice = from_document(Document { id, body })?;
    tracing::info!(reservation_id = %invoice.reservation_id, "Invoice complete for reservation");
    Ok(Outcome::json(StatusCode::OK, &invoice))
}

pub async fn get_invoice(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let id = request.param("id");
    if Uuid::parse_str(id).is_err() {
        return Ok(Outcome::bad_request(format!("({id}) is not a valid invoiceID")));
    }

    match state.store.find_by_id(INVOICES, id).await? {
        Some(document) => {
            let invoice: Invoice = from_document(document)?;
            Ok(Outcome::json(StatusCode::OK, &invoice))
        }
        None => Ok(Outcome::not_found(format!(
            "Could not find invoice with ID: ({id})"
        ))),
    }
}

pub async fn invoice_for_reservation(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let reservation_id = request.param("resID");
    let filter = Filter::all().eq("reservationId", reservation_id);
    let first = state.store.find(INVOICES, &filter).await?.into_iter().next();

    match first {
        Some(document) => {
            let invoice: Invoice = from_document(document)?;
            Ok(Outcome::json(StatusCode::OK, &invoice))
        }
        None => Ok(Outcome::not_found(format!(
            "Could not find an invoice for reservation ID: ({reservation_id})"
        ))),
    }
}

pub async fn customer_invoices(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    invoices_for(&*state.store, "customerId", "customer", request.param("userID")).await
}

pub async fn vendor_invoices(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    invoices_for(&*state.store, "vendorId", "vendor", request.param("userID")).await
}

async fn invoices_for(
    store: &dyn DocumentStore,
    field: &str,
    label: &str,
    user_id: &str,
) -> Result<Outcome, ServiceError> {
    let documents = store.find(INVOICES, &Filter::all().eq(field, user_id)).await?;
    if documents.is_empty() {
        return Ok(Outcome::not_found(format!(
            "Could not find any invoices for {label} ID: ({user_id})"
        )));
    }

    let invoices = documents
        .into_iter()
        .map(from_document::<Invoice>)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Outcome::json(StatusCode::OK, &invoices))
}

pub async fn new_account<A: Account>(
    state: ServiceState,
    request: ApiRequest,
    _ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let account: A = match request.json() {
        Ok(account) => account,
        Err(e) => return Ok(Outcome::bad_request(e.to_string())),
    };
    if let Some(rejection) = reject_invalid(&account) {
        return Ok(rejection);
    }

    tracing::info!(kind = A::LABEL, "Adding new account");
    let body = to_body(&account)?;
    let id = state.store.insert(A::COLLECTION, body.clone()).await?;
    tracing::info!(kind = A::LABEL, id = %id, "Added new account");

    let account: A = from_document(Document { id, body })?;
    Ok(Outcome::json(StatusCode::OK, &account))
}

pub async fn update_account<A: Account>(
    state: ServiceState,
    request: ApiRequest,
    ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let account: A = match request.json() {
        Ok(account) => account,
        Err(e) => return Ok(Outcome::bad_request(e.to_string())),
    };
    if let Some(rejection) = reject_invalid(&account) {
        return Ok(rejection);
    }

    let user_id = account.user_id().to_string();
    tracing::info!(kind = A::LABEL, user_id = %user_id, "Updating account");
    let filter = Filter::all().eq("userId", user_id.as_str());
    let replaced = state
        .store
        .update(A::COLLECTION, &filter, to_body(&account)?)
        .await?;
    if replaced == 0 {
        return Err(ServiceError::Internal(format!(
            "No {} with UserID: ({user_id}) to update",
            A::LABEL
        )));
    }
    tracing::info!(kind = A::LABEL, user_id = %user_id, "Updated account");

    match find_account::<A>(&*state.store, &user_id, &ctx).await? {
        Some(updated) => Ok(Outcome::json(StatusCode::OK, &updated)),
        None => Err(ServiceError::Internal(format!(
            "Couldn't get the updated {}",
            A::LABEL
        ))),
    }
}

pub async fn get_account<A: Account>(
    state: ServiceState,
    request: ApiRequest,
    ctx: CorrelationContext,
) -> Result<Outcome, ServiceError> {
    let user_id = request.param("userID");
    match find_account::<A>(&*state.store, user_id, &ctx).await? {
        Some(account) => Ok(Outcome::json(StatusCode::OK, &account)),
        None => Ok(Outcome::not_found(format!(
            "Could not find {} with UserID: ({user_id})",
            A::LABEL
        ))),
    }
}

async fn find_account<A: Account>(
    store: &dyn DocumentStore,
    user_id: &str,
    ctx: &CorrelationContext,
) -> Result<Option<A>, ServiceError> {
    let documents = store
        .find(A::COLLECTION, &Filter::all().eq("userId", user_id))
        .await?;
    if documents.len() > 1 {
        tracing::error!(
            request_id = %ctx.request_id(),
            kind = A::LABEL,
            user_id,
            count = documents.len(),
            "Multiple accounts share a UserID, using the first"
        );
    }

    Ok(documents
        .into_iter()
        .next()
        .map(from_document::<A>)
        .transpose()?)
}
