//! Billing endpoints driven through the full middleware stack.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

use bikeshare_services::http::REQUEST_ID_HEADER;
use bikeshare_services::ServiceKind;

mod common;

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    common::send(router, request(method, uri, body)).await
}

fn invoice(reservation_id: &str) -> Value {
    json!({
        "customerId": "cust-1",
        "vendorId": "vend-1",
        "bikeId": "bike-1",
        "reservationId": reservation_id,
        "amount": 12.5
    })
}

#[tokio::test]
async fn test_hello_needs_no_header() {
    let (router, _) = common::service_router(ServiceKind::Billing);
    let (status, body) =
        common::send(&router, Request::get("/hello").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{\"status\":\"Hello!\"}\n");
}

#[tokio::test]
async fn test_api_requires_header() {
    let (router, _) = common::service_router(ServiceKind::Billing);
    let request = Request::post("/api/invoice")
        .body(Body::from(invoice("res-1").to_string()))
        .unwrap();
    let (status, body) = common::send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_invoice_lifecycle() {
    let (router, _) = common::service_router(ServiceKind::Billing);

    let (status, body) = call(&router, Method::POST, "/api/invoice", Some(invoice("res-1"))).await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_str(&body).unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(Uuid::parse_str(&id).is_ok());
    assert_eq!(created["reservationId"], "res-1");

    let (status, body) = call(&router, Method::GET, &format!("/api/invoice/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), created);

    let (status, body) = call(&router, Method::GET, "/api/reservation/res-1/invoice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["id"], id.as_str());

    let (status, body) = call(&router, Method::GET, "/api/customer/cust-1/invoices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Vec<Value>>(&body).unwrap().len(), 1);

    let (status, _) = call(&router, Method::GET, "/api/vendor/vend-1/invoices", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invoice_lookups_distinguish_bad_and_missing_ids() {
    let (router, _) = common::service_router(ServiceKind::Billing);

    let (status, body) = call(&router, Method::GET, "/api/invoice/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "(not-an-id) is not a valid invoiceID\n");

    let missing = Uuid::new_v4();
    let (status, _) = call(&router, Method::GET, &format!("/api/invoice/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&router, Method::GET, "/api/customer/nobody/invoices", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("(nobody)"));

    let (status, _) = call(&router, Method::GET, "/api/reservation/none/invoice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_invoice_lists_every_violation() {
    let (router, _) = common::service_router(ServiceKind::Billing);
    let (status, body) = call(
        &router,
        Method::POST,
        "/api/invoice",
        Some(json!({"id": "preset", "bikeId": "bike-1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let violations: Vec<String> = serde_json::from_str(&body).unwrap();
    assert_eq!(
        violations,
        vec![
            "Must not specify ID string",
            "Must specify CustomerID string",
            "Must specify ReservationID string",
            "Must specify VendorID string",
        ]
    );
}

#[tokio::test]
async fn test_undecodable_body_is_bad_request() {
    let (router, _) = common::service_router(ServiceKind::Billing);
    let request = Request::post("/api/vendor")
        .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = common::send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_create_update_and_read() {
    let (router, _) = common::service_router(ServiceKind::Billing);
    let customer = json!({
        "userId": "user-7",
        "ccNumber": "4111111111111111",
        "ccExpiry": "12/30",
        "ccCCV": "123"
    });

    let (status, body) = call(&router, Method::POST, "/api/customer", Some(customer.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert!(!created["id"].as_str().unwrap().is_empty());

    let mut changed = customer;
    changed["ccExpiry"] = json!("01/31");
    let (status, body) = call(&router, Method::PATCH, "/api/customer", Some(changed)).await;
    assert_eq!(status, StatusCode::OK);
    let updated: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(updated["ccExpiry"], "01/31");
    assert_eq!(updated["id"], created["id"]);

    let (status, body) = call(&router, Method::GET, "/api/customer/user-7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), updated);

    let (status, body) = call(&router, Method::GET, "/api/customer/user-8", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Could not find customer with UserID: (user-8)\n");
}

#[tokio::test]
async fn test_updating_unknown_vendor_is_internal_error() {
    let (router, _) = common::service_router(ServiceKind::Billing);
    let vendor = json!({"userId": "ghost", "routingNumber": "r", "accountNumber": "a"});

    let (status, body) = call(&router, Method::PATCH, "/api/vendor", Some(vendor)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("ghost"));
}

#[tokio::test]
async fn test_closed_store_surfaces_as_500() {
    let (router, store) = common::service_router(ServiceKind::Billing);
    bikeshare_services::store::DocumentStore::close(store.as_ref()).await;

    let (status, body) = call(&router, Method::POST, "/api/invoice", Some(invoice("res-9"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("closed"));
}
