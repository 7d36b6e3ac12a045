mod common;

use common::{response_json, TestApp};
use axum::http::{Method, StatusCode};
use orchard_api::{errors::ServiceError, services::cart::AddCartItemInput};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

fn mango(quantity: Option<i32>) -> AddCartItemInput {
    AddCartItemInput {
        product_name: "Mango".to_string(),
        unit_price: dec!(5.00),
        image_ref: "img/mango.png".to_string(),
        quantity,
        created_by: None,
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn add_and_list_items() {
    let app = TestApp::new().await;
    let cart = &app.state.services.cart;
    let owner = app.user_id;

    let item = cart.add_item(owner, mango(None)).await.unwrap();
    assert_eq!(item.quantity, 1);
    assert_eq!(item.unit_price, dec!(5.00));

    let items = cart.list_items(owner).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, item.id);

    // Another owner's cart stays empty
    let other_items = cart.list_items(Uuid::new_v4()).await.unwrap();
    assert!(other_items.is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn add_rejects_missing_name_and_bad_price() {
    let app = TestApp::new().await;
    let cart = &app.state.services.cart;

    let mut no_name = mango(None);
    no_name.product_name = "  ".to_string();
    assert!(matches!(
        cart.add_item(app.user_id, no_name).await,
        Err(ServiceError::ValidationError(_))
    ));

    let mut free = mango(None);
    free.unit_price = dec!(0);
    assert!(matches!(
        cart.add_item(app.user_id, free).await,
        Err(ServiceError::ValidationError(_))
    ));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn quantity_floor_is_enforced() {
    let app = TestApp::new().await;
    let cart = &app.state.services.cart;
    let owner = app.user_id;

    let item = cart.add_item(owner, mango(Some(2))).await.unwrap();

    for bad in [0, -1, -100] {
        assert!(matches!(
            cart.update_quantity(owner, item.id, bad).await,
            Err(ServiceError::ValidationError(_))
        ));
    }

    // Nothing below 1 was ever persisted
    let items = cart.list_items(owner).await.unwrap();
    assert_eq!(items[0].quantity, 2);

    let updated = cart.update_quantity(owner, item.id, 7).await.unwrap();
    assert_eq!(updated.quantity, 7);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn update_quantity_is_owner_scoped() {
    let app = TestApp::new().await;
    let cart = &app.state.services.cart;
    let owner = app.user_id;

    let item = cart.add_item(owner, mango(Some(1))).await.unwrap();

    // A different user cannot touch the line item even with its id
    let stranger = Uuid::new_v4();
    assert!(matches!(
        cart.update_quantity(stranger, item.id, 5).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        cart.remove_item(stranger, item.id).await,
        Err(ServiceError::NotFound(_))
    ));

    let items = cart.list_items(owner).await.unwrap();
    assert_eq!(items[0].quantity, 1);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn remove_item_then_not_found() {
    let app = TestApp::new().await;
    let cart = &app.state.services.cart;
    let owner = app.user_id;

    let item = cart.add_item(owner, mango(None)).await.unwrap();
    cart.remove_item(owner, item.id).await.unwrap();

    assert!(matches!(
        cart.remove_item(owner, item.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn clear_is_idempotent() {
    let app = TestApp::new().await;
    let cart = &app.state.services.cart;
    let owner = app.user_id;

    cart.add_item(owner, mango(None)).await.unwrap();
    cart.add_item(
        owner,
        AddCartItemInput {
            product_name: "Toffee".to_string(),
            unit_price: dec!(1.25),
            image_ref: "img/toffee.png".to_string(),
            quantity: Some(3),
            created_by: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(cart.clear_for_owner(owner).await.unwrap(), 2);
    // Clearing an already-empty cart is a no-op
    assert_eq!(cart.clear_for_owner(owner).await.unwrap(), 0);
    assert!(cart.list_items(owner).await.unwrap().is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn http_cart_flow() {
    let app = TestApp::new().await;

    // Unauthenticated requests are rejected
    let response = app
        .request_anonymous(Method::GET, "/api/v1/cart/items", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Empty cart is 200 with an empty list, not 404
    let response = app
        .request_authenticated(Method::GET, "/api/v1/cart/items", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!([]));

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({
                "product_name": "Mango",
                "unit_price": "5.00",
                "image_ref": "img/mango.png",
                "quantity": 2
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    let item_id = created["id"].as_str().unwrap().to_string();

    // Body owner_id that disagrees with the token is rejected
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({
                "product_name": "Toffee",
                "unit_price": "1.25",
                "image_ref": "img/toffee.png",
                "owner_id": Uuid::new_v4()
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Quantity below the floor is rejected at the boundary
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/cart/items/{}", item_id),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/cart/items/{}", item_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
