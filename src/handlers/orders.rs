use crate::handlers::common::{map_service_error, success_response};
use crate::{auth::AuthUser, errors::ApiError, AppState};
use axum::{
    extract::{Extension, State},
    routing::get,
    Router,
};
use std::sync::Arc;

/// Creates the router for order endpoints
pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders))
        .route("/completed", get(list_completed_orders))
}

/// List every order belonging to the caller, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses((status = 200, description = "Orders for the caller")),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let orders = state
        .services
        .order
        .list_for_owner(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// List the caller's completed orders
#[utoipa::path(
    get,
    path = "/api/v1/orders/completed",
    responses((status = 200, description = "Completed orders for the caller")),
    tag = "Orders"
)]
pub async fn list_completed_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let orders = state
        .services
        .order
        .list_completed_for_owner(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}
