use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    auth::AuthUser, errors::ApiError, services::cart::AddCartItemInput, AppState,
};
use axum::{
    extract::{Extension, Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", post(add_to_cart))
        .route("/items", get(list_cart_items))
        .route("/items/:item_id", put(update_cart_item))
        .route("/items/:item_id", delete(remove_cart_item))
}

/// Add a line item to the caller's cart
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    responses(
        (status = 201, description = "Line item created"),
        (status = 400, description = "Missing name or non-positive price", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    // The body may echo an owner id for cross-checking, but the token decides
    if let Some(owner_id) = payload.owner_id {
        if owner_id != user.user_id {
            return Err(ApiError::BadRequest(
                "owner_id does not match the authenticated user".to_string(),
            ));
        }
    }

    let input = AddCartItemInput {
        product_name: payload.product_name,
        unit_price: payload.unit_price,
        image_ref: payload.image_ref,
        quantity: payload.quantity,
        created_by: Some(user.user_id.to_string()),
    };

    let item = state
        .services
        .cart
        .add_item(user.user_id, input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(item))
}

/// List the caller's cart. An empty cart returns an empty list, not 404.
#[utoipa::path(
    get,
    path = "/api/v1/cart/items",
    responses((status = 200, description = "Cart line items")),
    tag = "Cart"
)]
pub async fn list_cart_items(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let items = state
        .services
        .cart
        .list_items(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(items))
}

/// Update the quantity of an owned line item
#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{item_id}",
    responses(
        (status = 200, description = "Quantity updated"),
        (status = 400, description = "Quantity below 1", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such line item", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .cart
        .update_quantity(user.user_id, item_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(item))
}

/// Remove an owned line item
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{item_id}",
    responses(
        (status = 204, description = "Line item removed"),
        (status = 404, description = "No such line item", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn remove_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .cart
        .remove_item(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

// Request DTOs

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddItemRequest {
    pub product_name: String,
    pub unit_price: Decimal,
    pub image_ref: String,
    pub quantity: Option<i32>,
    /// Optional echo of the owner; cross-checked against the token
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
}
