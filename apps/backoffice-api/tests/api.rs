//! Router tests against an in-memory database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use backoffice_api::{build_router, ApiConfig, AppState};
use tripdesk_db::{Database, DbConfig};

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    build_router(AppState::new(db, ApiConfig::default()))
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    dispatch(router, request).await
}

/// Sends a body as-is, for requests `serde_json` would refuse to build.
async fn send_raw(router: &Router, uri: &str, content_type: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    dispatch(router, request).await
}

async fn dispatch(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes).unwrap()
    };
    (status, json)
}

/// Trip at 10,000.00, one customer, one sales user at 150.00 per head.
async fn fixtures(router: &Router) -> (String, String, String) {
    let (status, trip) = send(
        router,
        "POST",
        "/api/v1/trips",
        Some(json!({
            "code": "IST-2026-05",
            "name": "Istanbul Highlights",
            "destination": "Istanbul",
            "departure_date": "2026-05-01",
            "return_date": "2026-05-08",
            "base_price_cents": 1_000_000,
            "capacity": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{trip}");

    let (status, customer) = send(
        router,
        "POST",
        "/api/v1/customers",
        Some(json!({
            "first_name": "Deniz",
            "last_name": "Yilmaz",
            "email": "deniz@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{customer}");

    let (status, user) = send(
        router,
        "POST",
        "/api/v1/users",
        Some(json!({
            "name": "Ayla Sahin",
            "email": "ayla@agency.example",
            "role": "sales",
            "commission_per_head_cents": 15_000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");

    (
        trip["id"].as_str().unwrap().to_string(),
        customer["id"].as_str().unwrap().to_string(),
        user["id"].as_str().unwrap().to_string(),
    )
}

fn booking_body(trip_id: &str, customer_id: &str, sales_id: &str, first_payment: i64) -> Value {
    json!({
        "trip_id": trip_id,
        "customer_id": customer_id,
        "sales_user_id": sales_id,
        "extras": { "bag_cents": 50_000 },
        "discount_cents": 30_000,
        "payment_ratio": "half",
        "first_payment": { "amount_cents": first_payment, "method": "card" }
    })
}

#[tokio::test]
async fn test_health() {
    let router = app().await;
    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_quote_matches_booking_rules() {
    let router = app().await;
    let (trip_id, _, _) = fixtures(&router).await;

    let (status, quote) = send(
        &router,
        "POST",
        "/api/v1/bookings/quote",
        Some(json!({
            "trip_id": trip_id,
            "extras": { "bag_cents": 50_000 },
            "discount_cents": 30_000,
            "payment_ratio": "half"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{quote}");
    assert_eq!(quote["price"]["total"], 1_020_000);
    assert_eq!(quote["first_payment"], 510_000);
}

#[tokio::test]
async fn test_booking_lifecycle_creates_commission() {
    let router = app().await;
    let (trip_id, customer_id, sales_id) = fixtures(&router).await;

    let (status, detail) = send(
        &router,
        "POST",
        "/api/v1/bookings",
        Some(booking_body(&trip_id, &customer_id, &sales_id, 510_000)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{detail}");
    assert_eq!(detail["booking"]["total_cents"], 1_020_000);
    assert_eq!(detail["booking"]["payment_status"], "partially_paid");
    assert_eq!(detail["outstanding_cents"], 510_000);
    let booking_id = detail["booking"]["id"].as_str().unwrap().to_string();

    let (status, detail) = send(
        &router,
        "POST",
        &format!("/api/v1/bookings/{booking_id}/payments"),
        Some(json!({ "amount_cents": 510_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{detail}");
    assert_eq!(detail["booking"]["payment_status"], "fully_paid");
    assert_eq!(detail["commission"]["status"], "payable");
    assert_eq!(detail["commission"]["amount_cents"], 15_000);
    let commission_id = detail["commission"]["id"].as_str().unwrap().to_string();

    // Nothing left to pay
    let (status, body) = send(
        &router,
        "POST",
        &format!("/api/v1/bookings/{booking_id}/payments"),
        Some(json!({ "amount_cents": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, summary) = send(
        &router,
        "GET",
        &format!("/api/v1/commissions/summary?user_id={sales_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary[0]["payable_cents"], 15_000);

    let (status, paid) = send(
        &router,
        "POST",
        &format!("/api/v1/commissions/{commission_id}/pay"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{paid}");
    assert_eq!(paid["status"], "paid");

    let (status, body) = send(
        &router,
        "POST",
        &format!("/api/v1/commissions/{commission_id}/pay"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(
        &router,
        "DELETE",
        &format!("/api/v1/bookings/{booking_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_first_payment_mismatch_is_rejected() {
    let router = app().await;
    let (trip_id, customer_id, sales_id) = fixtures(&router).await;

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/bookings",
        Some(booking_body(&trip_id, &customer_id, &sales_id, 500_000)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, list) = send(
        &router,
        "GET",
        &format!("/api/v1/bookings?trip_id={trip_id}"),
        None,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_second_open_booking_conflicts() {
    let router = app().await;
    let (trip_id, customer_id, sales_id) = fixtures(&router).await;
    let body = booking_body(&trip_id, &customer_id, &sales_id, 510_000);

    let (status, _) = send(&router, "POST", "/api/v1/bookings", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = send(&router, "POST", "/api/v1/bookings", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{error}");
}

#[tokio::test]
async fn test_status_transitions() {
    let router = app().await;
    let (trip_id, customer_id, sales_id) = fixtures(&router).await;

    let (_, detail) = send(
        &router,
        "POST",
        "/api/v1/bookings",
        Some(booking_body(&trip_id, &customer_id, &sales_id, 510_000)),
    )
    .await;
    let booking_id = detail["booking"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/bookings/{booking_id}/status");

    let (status, body) = send(&router, "PUT", &uri, Some(json!({ "status": "fully_paid" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    let (status, body) = send(&router, "PUT", &uri, Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["booking"]["payment_status"], "cancelled");

    let (status, _) = send(&router, "PUT", &uri, Some(json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_not_found_and_lead_conversion() {
    let router = app().await;

    let (status, body) = send(&router, "GET", "/api/v1/bookings/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, lead) = send(
        &router,
        "POST",
        "/api/v1/leads",
        Some(json!({ "full_name": "Selin Arslan", "email": "selin@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{lead}");
    let lead_id = lead["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/leads/{lead_id}/convert");
    let (status, conversion) = send(&router, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CREATED, "{conversion}");
    assert_eq!(conversion["lead"]["status"], "converted");
    assert_eq!(conversion["customer"]["first_name"], "Selin");
    assert_eq!(conversion["customer"]["last_name"], "Arslan");

    let (status, _) = send(&router, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_requests_use_error_body() {
    let router = app().await;

    let (status, body) = send_raw(&router, "/api/v1/customers", "application/json", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(!body["message"].as_str().unwrap().is_empty());

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/customers",
        Some(json!({ "first_name": 5, "last_name": "Yilmaz" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send_raw(&router, "/api/v1/customers", "text/plain", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&router, "GET", "/api/v1/bookings?payment_status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_full_trip_conflicts() {
    let router = app().await;
    let (trip_id, customer_id, sales_id) = fixtures(&router).await;

    let (status, trip) = send(
        &router,
        "PATCH",
        &format!("/api/v1/trips/{trip_id}"),
        Some(json!({ "capacity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{trip}");

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/bookings",
        Some(booking_body(&trip_id, &customer_id, &sales_id, 510_000)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["code"], "CONFLICT");
}
