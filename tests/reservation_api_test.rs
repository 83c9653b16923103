//! Reservation endpoints driven through the full middleware stack.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};

use bikeshare_services::ServiceKind;

mod common;

fn reservation(reservation_id: &str, user_id: &str) -> Value {
    json!({
        "reservationId": reservation_id,
        "bikeId": "bike-3",
        "userId": user_id,
        "requestTime": "2024-05-01T10:00:00Z",
        "startTime": "2024-05-01T10:05:00Z",
        "state": "Booking",
        "requestId": "req-1"
    })
}

fn post(body: String) -> Request<Body> {
    Request::post("/api/reservation")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_hello_is_plain_text() {
    let (router, _) = common::service_router(ServiceKind::Reservation);
    let response = tower::ServiceExt::oneshot(router, get("/hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn test_add_and_query_reservations_without_header() {
    let (router, _) = common::service_router(ServiceKind::Reservation);

    for (id, user) in [("r1", "alice"), ("r2", "bob"), ("r3", "alice")] {
        let (status, body) = common::send(&router, post(reservation(id, user).to_string())).await;
        assert_eq!(status, StatusCode::OK);
        let stored: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(stored["reservationId"], id);
        assert_eq!(stored["endTime"], "");
    }

    let (status, body) = common::send(&router, get("/api/reservation/r2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["userId"], "bob");

    let (_, body) = common::send(&router, get("/api/allReservations")).await;
    assert_eq!(serde_json::from_str::<Vec<Value>>(&body).unwrap().len(), 3);

    let (status, body) = common::send(&router, get("/api/user/alice/reservations")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = serde_json::from_str::<Vec<Value>>(&body)
        .unwrap()
        .iter()
        .map(|r| r["reservationId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["r1", "r3"]);
}

#[tokio::test]
async fn test_empty_listing_is_an_empty_array() {
    let (router, _) = common::service_router(ServiceKind::Reservation);
    let (status, body) = common::send(&router, get("/api/user/nobody/reservations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]\n");
}

#[tokio::test]
async fn test_missing_reservation_is_bad_request() {
    let (router, _) = common::service_router(ServiceKind::Reservation);
    let (status, body) = common::send(&router, get("/api/reservation/r404")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "BadRequest: No reservation found for reservationId: r404\n");
}

#[tokio::test]
async fn test_rejects_bad_bodies() {
    let (router, _) = common::service_router(ServiceKind::Reservation);

    let (status, body) = common::send(&router, post("nope".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "BadRequest: Invalid request body.\n");

    let mut incomplete = reservation("r1", "alice");
    incomplete["state"] = json!("");
    let (status, body) = common::send(&router, post(incomplete.to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "[\"Must specify state string\"]\n");
}
