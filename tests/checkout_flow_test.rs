mod common;

use common::TestApp;
use orchard_api::{
    entities::delivery_detail::{DeliveryService, DeliveryType},
    entities::order::OrderStatus,
    errors::ServiceError,
    services::cart::AddCartItemInput,
    services::checkout::{PaymentMethod, StartCheckoutInput},
    services::delivery::SaveDeliveryDetailInput,
    services::orders::{OrderService, PAYMENT_AWAITING_VERIFICATION, PAYMENT_COLLECT_ON_DELIVERY},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed_cart(app: &TestApp, owner: Uuid) {
    app.state
        .services
        .cart
        .add_item(
            owner,
            AddCartItemInput {
                product_name: "Mango".to_string(),
                unit_price: dec!(5),
                image_ref: "img/mango.png".to_string(),
                quantity: Some(3),
                created_by: None,
            },
        )
        .await
        .unwrap();
}

async fn seed_delivery(app: &TestApp, owner: Uuid) -> Uuid {
    app.state
        .services
        .delivery
        .save(
            owner,
            SaveDeliveryDetailInput {
                customer_name: "A. Perera".to_string(),
                phone: "0712345678".to_string(),
                email: "a.perera@example.com".to_string(),
                address: "12 Lake Rd".to_string(),
                postal_code: "10100".to_string(),
                district: "Colombo".to_string(),
                delivery_type: DeliveryType::CashOnDelivery,
                delivery_service: DeliveryService::PickMe,
                amount: dec!(15),
                delivery_charge: dec!(2.50),
            },
        )
        .await
        .unwrap()
        .id
}

fn checkout_input(delivery_id: Uuid, method: PaymentMethod, key: &str) -> StartCheckoutInput {
    StartCheckoutInput {
        delivery_detail_id: delivery_id,
        payment_method: method,
        idempotency_key: key.to_string(),
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn cash_order_finalizes_and_clears_cart() {
    let app = TestApp::new().await;
    let owner = app.user_id;
    seed_cart(&app, owner).await;
    let delivery_id = seed_delivery(&app, owner).await;

    let outcome = app
        .state
        .services
        .checkout
        .start_checkout(
            owner,
            checkout_input(delivery_id, PaymentMethod::CashOnDelivery, "cash-1"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.order.status, OrderStatus::Processing);
    assert_eq!(outcome.order.payment_status, PAYMENT_COLLECT_ON_DELIVERY);
    assert!(outcome.session_id.is_none());
    assert!(!outcome.replayed);
    // 3 x 5.00 + 2.50 delivery charge
    assert_eq!(outcome.order.total_amount, dec!(17.50));

    // No confirmation step follows, so the cart empties immediately
    let cart_items = app.state.services.cart.list_items(owner).await.unwrap();
    assert!(cart_items.is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn bank_slip_order_awaits_verification() {
    let app = TestApp::new().await;
    let owner = app.user_id;
    seed_cart(&app, owner).await;
    let delivery_id = seed_delivery(&app, owner).await;

    let outcome = app
        .state
        .services
        .checkout
        .start_checkout(
            owner,
            checkout_input(delivery_id, PaymentMethod::BankSlip, "slip-1"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.order.status, OrderStatus::Processing);
    assert_eq!(outcome.order.payment_status, PAYMENT_AWAITING_VERIFICATION);
    assert!(app
        .state
        .services
        .cart
        .list_items(owner)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn order_snapshot_is_immune_to_later_cart_mutation() {
    let app = TestApp::new().await;
    let owner = app.user_id;
    seed_cart(&app, owner).await;
    let delivery_id = seed_delivery(&app, owner).await;

    let outcome = app
        .state
        .services
        .checkout
        .start_checkout(
            owner,
            checkout_input(delivery_id, PaymentMethod::CashOnDelivery, "snap-1"),
        )
        .await
        .unwrap();

    // Shop again after the order was placed
    let item = app
        .state
        .services
        .cart
        .add_item(
            owner,
            AddCartItemInput {
                product_name: "Mango".to_string(),
                unit_price: dec!(99),
                image_ref: "img/mango.png".to_string(),
                quantity: Some(5),
                created_by: None,
            },
        )
        .await
        .unwrap();
    app.state
        .services
        .cart
        .update_quantity(owner, item.id, 8)
        .await
        .unwrap();

    // The submitted order still reflects the checkout-time cart
    let order = app
        .state
        .services
        .order
        .find_by_order_number(&outcome.order.order_number)
        .await
        .unwrap()
        .unwrap();
    let lines = OrderService::lines_of(&order).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].name, "Mango");
    assert_eq!(lines[0].unit_price, dec!(5));
    assert_eq!(lines[0].quantity, 3);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn duplicate_idempotency_key_replays_original_order() {
    let app = TestApp::new().await;
    let owner = app.user_id;
    seed_cart(&app, owner).await;
    let delivery_id = seed_delivery(&app, owner).await;

    let first = app
        .state
        .services
        .checkout
        .start_checkout(
            owner,
            checkout_input(delivery_id, PaymentMethod::CashOnDelivery, "dup-key"),
        )
        .await
        .unwrap();

    // Client retries the submission with the same key
    seed_cart(&app, owner).await;
    let second = app
        .state
        .services
        .checkout
        .start_checkout(
            owner,
            checkout_input(delivery_id, PaymentMethod::CashOnDelivery, "dup-key"),
        )
        .await
        .unwrap();

    assert!(second.replayed);
    assert_eq!(second.order.id, first.order.id);
    assert_eq!(second.order.order_number, first.order.order_number);

    // Exactly one order exists for the owner
    let orders = app.state.services.order.list_for_owner(owner).await.unwrap();
    assert_eq!(orders.len(), 1);

    // Another user cannot ride the same key
    let err = app
        .state
        .services
        .checkout
        .start_checkout(
            Uuid::new_v4(),
            checkout_input(delivery_id, PaymentMethod::CashOnDelivery, "dup-key"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let owner = app.user_id;
    let delivery_id = seed_delivery(&app, owner).await;

    let err = app
        .state
        .services
        .checkout
        .start_checkout(
            owner,
            checkout_input(delivery_id, PaymentMethod::CashOnDelivery, "empty-1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn foreign_delivery_detail_is_rejected() {
    let app = TestApp::new().await;
    let owner = app.user_id;
    seed_cart(&app, owner).await;
    let foreign_delivery = seed_delivery(&app, Uuid::new_v4()).await;

    let err = app
        .state
        .services
        .checkout
        .start_checkout(
            owner,
            checkout_input(foreign_delivery, PaymentMethod::CashOnDelivery, "foreign-1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // Nothing was created and the cart is untouched
    assert!(app.state.services.order.list_for_owner(owner).await.unwrap().is_empty());
    assert_eq!(app.state.services.cart.list_items(owner).await.unwrap().len(), 1);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn sub_minimum_total_is_rejected() {
    let app = TestApp::new().await;
    let owner = app.user_id;

    app.state
        .services
        .cart
        .add_item(
            owner,
            AddCartItemInput {
                product_name: "Single toffee".to_string(),
                unit_price: dec!(0.10),
                image_ref: "img/toffee.png".to_string(),
                quantity: Some(1),
                created_by: None,
            },
        )
        .await
        .unwrap();

    let delivery_id = app
        .state
        .services
        .delivery
        .save(
            owner,
            SaveDeliveryDetailInput {
                customer_name: "A. Perera".to_string(),
                phone: "0712345678".to_string(),
                email: "a.perera@example.com".to_string(),
                address: "12 Lake Rd".to_string(),
                postal_code: "10100".to_string(),
                district: "Colombo".to_string(),
                delivery_type: DeliveryType::OnlinePayment,
                delivery_service: DeliveryService::Uber,
                amount: dec!(0.10),
                delivery_charge: Decimal::ZERO,
            },
        )
        .await
        .unwrap()
        .id;

    // 10 minor units is below the configured 50-unit floor
    let err = app
        .state
        .services
        .checkout
        .start_checkout(
            owner,
            checkout_input(delivery_id, PaymentMethod::Online, "tiny-1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
}
