//! Router-level tests: the checkout endpoint behind the gateway header.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use storefront_checkout::config::AppConfig;
use storefront_checkout::entities::user::UserRole;
use storefront_checkout::repositories::SqlCartStore;
use storefront_checkout::{app_router, AppState};

use common::*;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        redis_url: "redis://localhost:6379".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        ensure_schema: false,
        persist_timeout_secs: 10,
        side_effect_timeout_secs: 5,
    }
}

fn router_for(app: &TestApp) -> axum::Router {
    let state = Arc::new(AppState {
        db: app.db.clone(),
        config: test_config(),
        carts: Arc::new(SqlCartStore::new(app.db.clone())),
        checkout: Arc::new(app.checkout.clone()),
    });
    app_router(state)
}

fn checkout_body(address_id: Uuid, shift_id: Uuid) -> Value {
    json!({
        "full_name": "Dana Levy",
        "phone": "+972 52-123-4567",
        "address_id": address_id.to_string(),
        "shift_id": shift_id.to_string(),
        "payment_method": "card",
    })
}

fn checkout_request(customer: Option<Uuid>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/checkout")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(customer) = customer {
        builder = builder.header("x-customer-id", customer.to_string());
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn checkout_without_the_gateway_header_is_unauthorized() {
    let app = TestApp::new().await;
    let router = router_for(&app);

    let response = router
        .oneshot(checkout_request(
            None,
            &checkout_body(Uuid::new_v4(), Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_complete_checkout_round_trip_returns_the_order_number() {
    let app = TestApp::new().await;
    seed_settings(&app.db, dec!(15), dec!(25), dec!(200)).await;
    let customer = seed_user(&app.db, "Dana Levy", UserRole::Customer).await;
    let address = seed_address(&app.db, customer).await;
    let shift = seed_shift(&app.db).await;
    let product = seed_product(&app.db, dec!(150), None).await;
    seed_cart_item(&app.db, customer, product, 1).await;

    let router = router_for(&app);
    let response = router
        .oneshot(checkout_request(
            Some(customer),
            &checkout_body(address, shift),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert!(body["order_number"]
        .as_str()
        .unwrap()
        .starts_with("ORD-"));
}

#[tokio::test]
async fn field_violations_come_back_as_unprocessable_entity() {
    let app = TestApp::new().await;
    seed_settings(&app.db, dec!(15), dec!(25), dec!(200)).await;
    let customer = seed_user(&app.db, "Dana Levy", UserRole::Customer).await;
    let address = seed_address(&app.db, customer).await;
    let shift = seed_shift(&app.db).await;
    let product = seed_product(&app.db, dec!(150), None).await;
    seed_cart_item(&app.db, customer, product, 1).await;

    let mut body = checkout_body(address, shift);
    body["payment_method"] = json!("store_credit");

    let router = router_for(&app);
    let response = router
        .oneshot(checkout_request(Some(customer), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    let violations = body["violations"].as_array().unwrap();
    assert!(violations
        .iter()
        .any(|v| v["field"] == "payment_method"));
}

#[tokio::test]
async fn health_reports_the_database_as_up() {
    let app = TestApp::new().await;
    let router = router_for(&app);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}
