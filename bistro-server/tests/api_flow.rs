//! HTTP round trips through the full middleware stack
//!
//! 使用 in-memory SQLite、记录型短信和离线支付网关，通过 `oneshot` 调用。

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use bistro_server::core::{Config, ServerState};
use bistro_server::db::DbService;
use bistro_server::db::seed::seed_menu_if_empty;
use bistro_server::services::webhook_signature::sign_payload;
use bistro_server::services::{OfflineGateway, RecordingSms};

const WEBHOOK_SECRET: &str = "whsec_test";

async fn setup(admin_token: Option<&str>) -> (Router, ServerState, Arc<RecordingSms>) {
    let db = DbService::in_memory().await.unwrap();
    seed_menu_if_empty(&db.pool).await.unwrap();
    let sms = Arc::new(RecordingSms::new());

    let mut config = Config::default();
    config.restaurant_name = "The Bistro".into();
    config.timezone = chrono_tz::America::New_York;
    config.admin_token = admin_token.map(str::to_string);
    config.stripe.webhook_secret = Some(WEBHOOK_SECRET.into());

    let state = ServerState::with_services(config, db, sms.clone(), Arc::new(OfflineGateway));
    let app = bistro_server::api::build_app(&state).with_state(state.clone());
    (app, state, sms)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with(app, method, uri, body, None).await
}

async fn send_with(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn send_webhook(app: &Router, body: &str, signature: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn create_booking(app: &Router) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/reservations",
        Some(json!({
            "name": "Dana Reyes",
            "phone_number": "(555) 123-4567",
            "party_size": 2,
            "date": "2099-06-01",
            "time": "19:00",
            "party_orders": [
                {"person_name": "Dana Reyes", "items": [{"name": "Buffalo Wings", "quantity": 2}]}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health_reports_restaurant() {
    let (app, _, _) = setup(None).await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["restaurant"], "The Bistro");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (app, _, _) = setup(None).await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_caller_request_id_is_echoed() {
    let (app, _, _) = setup(None).await;
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "call-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "call-abc-123");
}

#[tokio::test]
async fn test_create_reservation_sends_confirmation() {
    let (app, _, sms) = setup(None).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/reservations",
        Some(json!({
            "name": "Dana Reyes",
            "phone_number": "(555) 123-4567",
            "party_size": 4,
            "date": "2099-06-01",
            "time": "19:00",
            "party_orders": [
                {"person_name": "Dana Reyes", "items": [{"name": "Buffalo Wings", "quantity": 2}]}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let number = body["reservation_number"].as_str().unwrap().to_string();
    assert_eq!(number.len(), 6);
    assert_eq!(body["phone_number"], "+15551234567");
    assert_eq!(body["payment_status"], "unpaid");
    assert!((body["bill_total"].as_f64().unwrap() - 25.98).abs() < 1e-9);

    let sent = sms.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+15551234567");
    assert!(sent[0].1.contains(&number));

    let (status, found) = send(&app, "GET", &format!("/api/reservations/by-number/{number}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["name"], "Dana Reyes");
}

#[tokio::test]
async fn test_unknown_reservation_is_not_found() {
    let (app, _, _) = setup(None).await;
    let (status, _) = send(&app, "GET", "/api/reservations/by-number/000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let (app, _, _) = setup(Some("s3cret")).await;

    let (status, _) = send(&app, "GET", "/api/reservations", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_with(&app, "GET", "/api/reservations", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_with(&app, "GET", "/api/reservations", None, Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    // 公共路由不受影响
    let (status, _) = send(&app, "GET", "/api/menu_items", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_empty_order_is_rejected() {
    let (app, state, _) = setup(None).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({"customer_name": "Sam", "customer_phone": "5559876543", "items": []})),
    )
    .await;
    assert!(status.is_client_error());
    assert!(body["code"].as_u64().is_some());

    let all = state.orders.list(&Default::default()).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_unknown_voice_function_is_bad_request() {
    let (app, _, _) = setup(None).await;
    let (status, _) = send(
        &app,
        "POST",
        "/receptionist",
        Some(json!({"function": "order_pizza", "argument": {"parsed": [{}]}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_receptionist_document_lists_functions() {
    let (app, _, _) = setup(None).await;
    let (status, body) = send(&app, "GET", "/receptionist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "1.0.0");
    let main = body["sections"]["main"].as_array().unwrap();
    assert!(main.iter().any(|verb| verb.get("ai").is_some()));
}

#[tokio::test]
async fn test_voice_order_then_pay_callback() {
    let (app, state, sms) = setup(None).await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({
            "order_type": "pickup",
            "customer_name": "Lee",
            "customer_phone": "+15552223333",
            "items": [{"name": "Prosecco", "quantity": 1}, {"name": "Lemon Tart", "quantity": 1}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    let number = created["order_number"].as_str().unwrap().to_string();
    assert_eq!(created["estimated_minutes"], 25);

    let (status, failed) = send(
        &app,
        "POST",
        "/api/signalwire/payment-callback",
        Some(json!({"payment": {
            "status": "failed",
            "error": "card declined",
            "parameters": [{"name": "order_number", "value": number}, {"name": "payment_type", "value": "order"}]
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(failed["message"].as_str().unwrap().contains("card declined"));

    let (status, paid) = send(
        &app,
        "POST",
        "/api/signalwire/payment-callback",
        Some(json!({"payment": {
            "status": "success",
            "amount": "19.00",
            "payment_processor_id": "pay_voice_1",
            "parameters": [
                {"name": "order_number", "value": number},
                {"name": "payment_type", "value": "order"},
                {"name": "phone_number", "value": "+15552223333"}
            ]
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!((paid["amount"].as_f64().unwrap() - 19.0).abs() < 1e-9);
    assert!(paid["voice_response"].as_str().unwrap().contains("$19.00"));

    let (status, view) = send(&app, "GET", &format!("/api/orders/{id}/payment-status"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["payment_status"], "paid");

    // 重复回调不会重复收款
    let (status, again) = send(
        &app,
        "POST",
        "/api/signalwire/payment-callback",
        Some(json!({"payment": {
            "status": "success",
            "amount": "19.00",
            "payment_processor_id": "pay_voice_1",
            "parameters": [{"name": "order_number", "value": number}, {"name": "payment_type", "value": "order"}]
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(again["details"]["confirmation_number"], paid["confirmation_number"]);
    let (_, view) = send(&app, "GET", &format!("/api/orders/{id}/payment-status"), None).await;
    assert_eq!(view["confirmation_number"], paid["confirmation_number"]);

    // 订单确认 + 收据
    assert!(sms.sent().len() >= 2);
    assert!(state.payment_sessions.list().is_empty());
}

#[tokio::test]
async fn test_party_order_cannot_be_paid_directly() {
    let (app, _, _) = setup(None).await;
    let booking = create_booking(&app).await;
    let reservation_id = booking["id"].as_i64().unwrap();

    let (_, detail) = send(&app, "GET", &format!("/api/reservations/{reservation_id}"), None).await;
    let party_order_id = detail["party_orders"][0]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/payments/intent",
        Some(json!({"order_id": party_order_id})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("reservation"));

    // 预订账单仍然可付
    let (status, intent) = send(
        &app,
        "POST",
        "/api/payments/intent",
        Some(json!({"reservation_id": reservation_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(intent["amount_cents"], 2598);
}

#[tokio::test]
async fn test_unsigned_or_forged_webhook_is_rejected() {
    let (app, _, _) = setup(None).await;
    let booking = create_booking(&app).await;
    let reservation_id = booking["id"].as_i64().unwrap();
    let (_, intent) = send(
        &app,
        "POST",
        "/api/payments/intent",
        Some(json!({"reservation_id": reservation_id})),
    )
    .await;
    let event = json!({
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": intent["payment_intent_id"], "amount": 2598}}
    })
    .to_string();

    let (status, _) = send_webhook(&app, &event, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let forged = sign_payload(event.as_bytes(), "whsec_guess", chrono::Utc::now().timestamp()).unwrap();
    let (status, body) = send_webhook(&app, &event, Some(&forged)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6006);

    let (_, view) = send(
        &app,
        "GET",
        &format!("/api/reservations/{reservation_id}/payment-status"),
        None,
    )
    .await;
    assert_eq!(view["payment_status"], "unpaid");
}

#[tokio::test]
async fn test_signed_webhook_marks_reservation_paid() {
    let (app, _, _) = setup(None).await;
    let booking = create_booking(&app).await;
    let reservation_id = booking["id"].as_i64().unwrap();
    let (_, intent) = send(
        &app,
        "POST",
        "/api/payments/intent",
        Some(json!({"reservation_id": reservation_id})),
    )
    .await;
    let event = json!({
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": intent["payment_intent_id"], "amount": 2598}}
    })
    .to_string();
    let signature = sign_payload(event.as_bytes(), WEBHOOK_SECRET, chrono::Utc::now().timestamp()).unwrap();

    let (status, ack) = send_webhook(&app, &event, Some(&signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["received"], true);
    assert!((ack["receipt"]["amount"].as_f64().unwrap() - 25.98).abs() < 1e-9);

    // 重放同一事件不改变任何东西
    let (status, ack) = send_webhook(&app, &event, Some(&signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.get("receipt").is_none());

    let (_, view) = send(
        &app,
        "GET",
        &format!("/api/reservations/{reservation_id}/payment-status"),
        None,
    )
    .await;
    assert_eq!(view["payment_status"], "paid");
}
