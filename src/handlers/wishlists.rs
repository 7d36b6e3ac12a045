use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response,
};
use crate::{
    auth::AuthUser, entities::wishlist_item::WishlistPriority, errors::ApiError,
    services::wishlist::AddWishlistItemInput, AppState,
};
use axum::{
    extract::{Extension, Json, Path, State},
    routing::{delete, get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Creates the router for wishlist endpoints
pub fn wishlist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", post(add_to_wishlist))
        .route("/items", get(list_wishlist))
        .route("/items/:item_id", delete(remove_from_wishlist))
        .route("/items/:item_id/move-to-cart", post(move_to_cart))
}

/// Add a product to the caller's wishlist
#[utoipa::path(
    post,
    path = "/api/v1/wishlist/items",
    responses(
        (status = 201, description = "Wishlist entry created"),
        (status = 409, description = "Product already wishlisted", body = crate::errors::ErrorResponse)
    ),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddWishlistRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let input = AddWishlistItemInput {
        product_ref: payload.product_ref,
        name: payload.name,
        price: payload.price,
        image_ref: payload.image_ref,
        description: payload.description,
        category: payload.category,
        priority: payload.priority,
    };

    let item = state
        .services
        .wishlist
        .add_item(user.user_id, input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(item))
}

/// List the caller's wishlist, priority first, newest within each band
#[utoipa::path(
    get,
    path = "/api/v1/wishlist/items",
    responses((status = 200, description = "Wishlist entries")),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let items = state
        .services
        .wishlist
        .list_items(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(items))
}

/// Remove an owned wishlist entry
#[utoipa::path(
    delete,
    path = "/api/v1/wishlist/items/{item_id}",
    responses(
        (status = 204, description = "Entry removed"),
        (status = 404, description = "No such entry", body = crate::errors::ErrorResponse)
    ),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .wishlist
        .remove_item(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Move a wishlist entry into the cart
#[utoipa::path(
    post,
    path = "/api/v1/wishlist/items/{item_id}/move-to-cart",
    responses(
        (status = 200, description = "Cart line item created from the entry"),
        (status = 404, description = "No such entry", body = crate::errors::ErrorResponse)
    ),
    tag = "Wishlist"
)]
pub async fn move_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart_item = state
        .services
        .wishlist
        .move_to_cart(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart_item))
}

// Request DTOs

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddWishlistRequest {
    pub product_ref: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_ref: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<WishlistPriority>,
}
