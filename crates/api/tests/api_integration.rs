//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::StatusId;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{InMemoryStore, MedicineRow, UserRow};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::with_default_statuses();
    store
        .insert_user(UserRow::new(1, "Lan Nguyen", "lan@example.com"))
        .await;
    store
        .insert_user(UserRow::new(2, "Minh Tran", "minh@example.com"))
        .await;
    store
        .insert_medicine(MedicineRow::new(7, "Paracetamol 500mg", 1000))
        .await;
    store.insert_medicine(MedicineRow::new(9, "Vitamin C", 500)).await;
    store
        .insert_medicine(MedicineRow::new(11, "Amoxicillin", 1235))
        .await;
    store
}

async fn setup() -> axum::Router {
    let state = api::create_default_state(seeded_store().await, StatusId::new(1));
    api::create_app(state, get_metrics_handle())
}

/// Sends one request and returns the status with the parsed JSON body (`Null` if empty).
async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

async fn create_standard_order(app: &axum::Router) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/orders/add",
        Some(json!({
            "user_id": 1,
            "shipping_address": "12 Hang Bai, Hanoi",
            "items": [
                { "medicine_id": 7, "quantity": 2 },
                { "medicine_id": 9, "quantity": 1 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    json["order_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["order_statuses"], 4);
}

#[tokio::test]
async fn test_create_order() {
    let app = setup().await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders/add",
        Some(json!({
            "user_id": 1,
            "shipping_address": "12 Hang Bai, Hanoi",
            "items": [
                { "medicine_id": 7, "quantity": 2 },
                { "medicine_id": 9, "quantity": 1 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["total_amount_cents"], 2500);
    assert_eq!(json["status_id"], 1);
    assert_eq!(json["status_name"], "Pending");
    assert_eq!(json["user_name"], "Lan Nguyen");
    assert_eq!(json["order_details"].as_array().unwrap().len(), 2);
    assert_eq!(json["order_details"][0]["price_cents"], 1000);
    assert!(json["created_at"].as_str().is_some());
}

#[tokio::test]
async fn test_create_order_skips_unknown_medicine() {
    let app = setup().await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders/add",
        Some(json!({
            "user_id": 1,
            "items": [
                { "medicine_id": 7, "quantity": 1 },
                { "medicine_id": 404, "quantity": 1 },
                { "medicine_id": 11, "quantity": 1 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["order_details"].as_array().unwrap().len(), 2);
    assert_eq!(json["total_amount_cents"], 2235);
}

#[tokio::test]
async fn test_create_order_without_user_is_bad_request() {
    let app = setup().await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders/add",
        Some(json!({ "items": [{ "medicine_id": 7, "quantity": 1 }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("User ID is required"));
}

#[tokio::test]
async fn test_create_order_with_unknown_user_is_not_found() {
    let app = setup().await;

    let (status, _) = send(&app, "POST", "/orders/add", Some(json!({ "user_id": 99 }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_order_with_zero_quantity_is_bad_request() {
    let app = setup().await;

    let (status, _) = send(
        &app,
        "POST",
        "/orders/add",
        Some(json!({ "user_id": 1, "items": [{ "medicine_id": 7, "quantity": 0 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(&app, "GET", "/orders/all", None).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_order_with_overflowing_total_is_bad_request() {
    let store = seeded_store().await;
    store
        .insert_medicine(MedicineRow::new(13, "Gold-coated tablet", 5_000_000_000))
        .await;
    let state = api::create_default_state(store, StatusId::new(1));
    let app = api::create_app(state, get_metrics_handle());

    let (status, json) = send(
        &app,
        "POST",
        "/orders/add",
        Some(json!({ "user_id": 1, "items": [{ "medicine_id": 13, "quantity": 2_000_000_000 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (_, json) = send(&app, "GET", "/orders/all", None).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_order_with_missing_status_is_server_error() {
    let app = setup().await;

    let (status, _) = send(
        &app,
        "POST",
        "/orders/add",
        Some(json!({ "user_id": 1, "status_id": 42 })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let app = setup().await;

    let (status, json) = send(&app, "GET", "/orders/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let app = setup().await;

    let (status, _) = send(&app, "GET", "/orders/not-a-number", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_replaces_lines() {
    let app = setup().await;
    let id = create_standard_order(&app).await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/orders/update/{id}"),
        Some(json!({
            "status_id": 1,
            "shipping_address": "7 Trang Tien, Hanoi",
            "items": [{ "medicine_id": 7, "quantity": 3 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_amount_cents"], 3000);
    assert_eq!(json["order_details"].as_array().unwrap().len(), 1);
    assert_eq!(json["user_id"], 1);
    assert_eq!(json["shipping_address"], "7 Trang Tien, Hanoi");

    let (_, lines) = send(&app, "GET", &format!("/orderdetails/order/{id}"), None).await;
    assert_eq!(lines.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_with_unknown_status_is_bad_request() {
    let app = setup().await;
    let id = create_standard_order(&app).await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/orders/update/{id}"),
        Some(json!({ "status_id": 42, "items": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("status"));

    let (_, order) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(order["total_amount_cents"], 2500);
}

#[tokio::test]
async fn test_update_nonexistent_order() {
    let app = setup().await;

    let (status, _) = send(
        &app,
        "PUT",
        "/orders/update/999",
        Some(json!({ "status_id": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_transitions() {
    let app = setup().await;
    let id = create_standard_order(&app).await;

    let (status, json) = send(&app, "PUT", &format!("/orders/confirm/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status_name"], "Processing");

    let (status, json) = send(&app, "PUT", &format!("/orders/confirm/{id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("only Pending orders can be confirmed")
    );

    let (status, json) = send(&app, "PUT", &format!("/orders/complete/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status_name"], "Completed");

    let (status, _) = send(&app, "PUT", &format!("/orders/cancel/{id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_pending_order() {
    let app = setup().await;
    let id = create_standard_order(&app).await;

    let (status, json) = send(&app, "PUT", &format!("/orders/cancel/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status_id"], 4);
    assert_eq!(json["total_amount_cents"], 2500);
}

#[tokio::test]
async fn test_transition_nonexistent_order() {
    let app = setup().await;

    let (status, _) = send(&app, "PUT", "/orders/confirm/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_order() {
    let app = setup().await;
    let id = create_standard_order(&app).await;

    let (status, json) = send(&app, "DELETE", &format!("/orders/delete/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);

    let (status, _) = send(&app, "DELETE", &format!("/orders/delete/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, lines) = send(&app, "GET", "/orderdetails/medicine/7", None).await;
    assert!(lines.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_orders() {
    let app = setup().await;
    create_standard_order(&app).await;
    send(
        &app,
        "POST",
        "/orders/add",
        Some(json!({ "user_id": 2, "items": [{ "medicine_id": 9, "quantity": 2 }] })),
    )
    .await;

    let (status, json) = send(&app, "GET", "/orders/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (status, json) = send(&app, "GET", "/orders/user/minh@example.com", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["total_amount_cents"], 1000);
}

#[tokio::test]
async fn test_list_by_unknown_email_is_empty() {
    let app = setup().await;
    create_standard_order(&app).await;

    let (status, json) = send(&app, "GET", "/orders/user/nobody@example.com", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_detail_endpoints() {
    let app = setup().await;
    let id = create_standard_order(&app).await;

    let (status, line) = send(&app, "GET", &format!("/orderdetails/{id}/7"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(line["quantity"], 2);
    assert_eq!(line["medicine_name"], "Paracetamol 500mg");

    let (status, line) = send(
        &app,
        "POST",
        "/orderdetails",
        Some(json!({ "order_id": id, "medicine_id": 11, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(line["price_cents"], 1235);

    let (_, order) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(order["total_amount_cents"], 3735);

    let (status, _) = send(&app, "DELETE", &format!("/orderdetails/{id}/7"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, order) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(order["total_amount_cents"], 1735);

    let (status, _) = send(&app, "GET", &format!("/orderdetails/{id}/7"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/orderdetails/{id}/7"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_existing_line_is_noop() {
    let app = setup().await;
    let id = create_standard_order(&app).await;

    let (status, line) = send(
        &app,
        "POST",
        "/orderdetails",
        Some(json!({ "order_id": id, "medicine_id": 7, "quantity": 9 })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(line["quantity"], 2);

    let (_, order) = send(&app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(order["total_amount_cents"], 2500);
}

#[tokio::test]
async fn test_add_line_validation() {
    let app = setup().await;
    let id = create_standard_order(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/orderdetails",
        Some(json!({ "order_id": id, "medicine_id": 11 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/orderdetails",
        Some(json!({ "order_id": id, "medicine_id": 404, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/orderdetails",
        Some(json!({ "order_id": 999, "medicine_id": 11, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    create_standard_order(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_created_total"));
}
