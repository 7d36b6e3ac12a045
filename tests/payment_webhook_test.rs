mod common;

use common::TestApp;
use axum::http::{Method, StatusCode};
use hmac::{Hmac, Mac};
use orchard_api::{
    entities::order::{OrderLine, OrderStatus},
    services::cart::AddCartItemInput,
    services::orders::{CreateOrderParams, PAYMENT_PENDING},
};
use rust_decimal_macros::dec;
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const WEBHOOK_SECRET: &str = "whsec_orchard_test";

fn sign_payload(payload: &[u8]) -> Vec<(&'static str, String)> {
    let ts = chrono::Utc::now().timestamp();
    let signed = format!("{}.{}", ts, std::str::from_utf8(payload).unwrap());
    let mut mac = HmacSha256::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(signed.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    vec![
        ("x-timestamp", ts.to_string()),
        ("x-signature", signature),
        ("content-type", "application/json".to_string()),
    ]
}

async fn seed_pending_order(app: &TestApp, owner: Uuid) -> String {
    let order = app
        .state
        .services
        .order
        .create_order(CreateOrderParams {
            owner_id: owner,
            delivery_detail_id: Uuid::new_v4(),
            lines: vec![OrderLine {
                name: "Mango".to_string(),
                unit_price: dec!(5),
                quantity: 2,
            }],
            total_amount: dec!(10),
            status: OrderStatus::Pending,
            payment_status: PAYMENT_PENDING.to_string(),
            checkout_session_ref: Some("cs_test_1".to_string()),
            idempotency_key: Uuid::new_v4().to_string(),
        })
        .await
        .unwrap();
    order.order_number
}

fn completed_event(event_id: &str, order_number: &str, owner: Uuid) -> Vec<u8> {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_test_1",
                "payment_status": "paid",
                "payment_intent": "pi_test_1",
                "metadata": {
                    "order_number": order_number,
                    "owner_id": owner.to_string()
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn invalid_signature_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let owner = app.user_id;
    let order_number = seed_pending_order(&app, owner).await;

    let payload = completed_event("evt_bad", &order_number, owner);
    let headers = vec![
        ("x-timestamp", chrono::Utc::now().timestamp().to_string()),
        ("x-signature", "deadbeef".repeat(8)),
        ("content-type", "application/json".to_string()),
    ];

    let response = app
        .request_raw(Method::POST, "/api/v1/payments/webhook", &headers, payload)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // No order changed state
    let order = app
        .state
        .services
        .order
        .find_by_order_number(&order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PAYMENT_PENDING);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn missing_signature_headers_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_raw(
            Method::POST,
            "/api/v1/payments/webhook",
            &[("content-type", "application/json".to_string())],
            b"{}".to_vec(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn completed_event_settles_order_and_clears_cart() {
    let app = TestApp::new().await;
    let owner = app.user_id;

    app.state
        .services
        .cart
        .add_item(
            owner,
            AddCartItemInput {
                product_name: "Mango".to_string(),
                unit_price: dec!(5),
                image_ref: "img/mango.png".to_string(),
                quantity: Some(2),
                created_by: None,
            },
        )
        .await
        .unwrap();
    let order_number = seed_pending_order(&app, owner).await;

    let payload = completed_event("evt_1", &order_number, owner);
    let headers = sign_payload(&payload);

    let response = app
        .request_raw(Method::POST, "/api/v1/payments/webhook", &headers, payload)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let order = app
        .state
        .services
        .order
        .find_by_order_number(&order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment_status, "paid");
    assert_eq!(order.payment_intent_ref.as_deref(), Some("pi_test_1"));

    let cart_items = app.state.services.cart.list_items(owner).await.unwrap();
    assert!(cart_items.is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn duplicate_completed_event_is_a_no_op() {
    let app = TestApp::new().await;
    let owner = app.user_id;
    let order_number = seed_pending_order(&app, owner).await;

    let payload = completed_event("evt_dup", &order_number, owner);
    let headers = sign_payload(&payload);
    let response = app
        .request_raw(
            Method::POST,
            "/api/v1/payments/webhook",
            &headers,
            payload.clone(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Shop again between deliveries
    app.state
        .services
        .cart
        .add_item(
            owner,
            AddCartItemInput {
                product_name: "Toffee".to_string(),
                unit_price: dec!(1.25),
                image_ref: "img/toffee.png".to_string(),
                quantity: Some(1),
                created_by: None,
            },
        )
        .await
        .unwrap();

    // Redelivery of the same event acknowledges without re-applying
    let headers = sign_payload(&payload);
    let response = app
        .request_raw(Method::POST, "/api/v1/payments/webhook", &headers, payload)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let order = app
        .state
        .services
        .order
        .find_by_order_number(&order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    // The new cart content survived: no double clear
    let cart_items = app.state.services.cart.list_items(owner).await.unwrap();
    assert_eq!(cart_items.len(), 1);
    assert_eq!(cart_items[0].product_name, "Toffee");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn unmatched_order_number_is_absorbed() {
    let app = TestApp::new().await;
    let owner = app.user_id;

    let payload = completed_event("evt_ghost", "ORD-DOESNOTX", owner);
    let headers = sign_payload(&payload);

    // 200 so the notifier stops retrying a permanently-unmatchable event
    let response = app
        .request_raw(Method::POST, "/api/v1/payments/webhook", &headers, payload)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn unrelated_event_types_are_acknowledged() {
    let app = TestApp::new().await;

    let payload = json!({
        "id": "evt_other",
        "type": "invoice.paid",
        "data": { "object": {} }
    })
    .to_string()
    .into_bytes();
    let headers = sign_payload(&payload);

    let response = app
        .request_raw(Method::POST, "/api/v1/payments/webhook", &headers, payload)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
