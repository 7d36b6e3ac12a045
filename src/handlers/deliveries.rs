use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response,
};
use crate::{
    auth::AuthUser,
    entities::delivery_detail::{DeliveryService as Carrier, DeliveryStatus, DeliveryType},
    errors::ApiError,
    services::delivery::SaveDeliveryDetailInput,
    AppState,
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

/// Creates the router for user-facing delivery endpoints
pub fn delivery_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(save_delivery_details))
        .route("/", get(list_delivery_details))
        .route("/:id", get(get_delivery_detail))
        .route("/:id", delete(delete_delivery_detail))
}

/// Creates the router for admin delivery endpoints
pub fn delivery_admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/all", get(list_all_deliveries))
        .route("/cancelled", get(list_cancelled_deliveries))
        .route("/:id/status", put(update_delivery_status))
}

/// A well-formed-but-absent id is 404; a structurally invalid one is 400.
fn parse_delivery_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest("Invalid delivery detail id format".to_string()))
}

/// Save a delivery record; the stored total is computed server-side
#[utoipa::path(
    post,
    path = "/api/v1/deliveries",
    responses(
        (status = 201, description = "Delivery record created"),
        (status = 400, description = "Missing or malformed fields", body = crate::errors::ErrorResponse)
    ),
    tag = "Deliveries"
)]
pub async fn save_delivery_details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SaveDeliveryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let input = SaveDeliveryDetailInput {
        customer_name: payload.customer_name,
        phone: payload.phone,
        email: payload.email,
        address: payload.address,
        postal_code: payload.postal_code,
        district: payload.district,
        delivery_type: payload.delivery_type,
        delivery_service: payload.delivery_service,
        amount: payload.amount,
        delivery_charge: payload.delivery_charge,
    };

    let detail = state
        .services
        .delivery
        .save(user.user_id, input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(detail))
}

/// List the caller's delivery records
#[utoipa::path(
    get,
    path = "/api/v1/deliveries",
    responses((status = 200, description = "Delivery records")),
    tag = "Deliveries"
)]
pub async fn list_delivery_details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let details = state
        .services
        .delivery
        .list_for_owner(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(details))
}

/// Fetch one delivery record
#[utoipa::path(
    get,
    path = "/api/v1/deliveries/{id}",
    responses(
        (status = 200, description = "Delivery record"),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such record", body = crate::errors::ErrorResponse)
    ),
    tag = "Deliveries"
)]
pub async fn get_delivery_detail(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let id = parse_delivery_id(&id)?;

    let detail = state
        .services
        .delivery
        .get_by_id(id)
        .await
        .map_err(map_service_error)?;

    if detail.owner_id != user.user_id && !user.is_admin() {
        return Err(ApiError::NotFound(format!(
            "Delivery detail {} not found",
            id
        )));
    }

    Ok(success_response(detail))
}

/// Delete one delivery record
#[utoipa::path(
    delete,
    path = "/api/v1/deliveries/{id}",
    responses(
        (status = 204, description = "Record deleted"),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such record", body = crate::errors::ErrorResponse)
    ),
    tag = "Deliveries"
)]
pub async fn delete_delivery_detail(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let id = parse_delivery_id(&id)?;

    let detail = state
        .services
        .delivery
        .get_by_id(id)
        .await
        .map_err(map_service_error)?;
    if detail.owner_id != user.user_id && !user.is_admin() {
        return Err(ApiError::NotFound(format!(
            "Delivery detail {} not found",
            id
        )));
    }

    state
        .services
        .delivery
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Admin: every delivery record
#[utoipa::path(
    get,
    path = "/api/v1/deliveries/all",
    responses((status = 200, description = "All delivery records")),
    tag = "Deliveries"
)]
pub async fn list_all_deliveries(
    State(state): State<Arc<AppState>>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let details = state
        .services
        .delivery
        .list_all()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(details))
}

/// Admin: cancelled deliveries
#[utoipa::path(
    get,
    path = "/api/v1/deliveries/cancelled",
    responses((status = 200, description = "Cancelled delivery records")),
    tag = "Deliveries"
)]
pub async fn list_cancelled_deliveries(
    State(state): State<Arc<AppState>>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let details = state
        .services
        .delivery
        .list_cancelled()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(details))
}

/// Admin: transition a delivery's status
#[utoipa::path(
    put,
    path = "/api/v1/deliveries/{id}/status",
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such record", body = crate::errors::ErrorResponse)
    ),
    tag = "Deliveries"
)]
pub async fn update_delivery_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDeliveryStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let id = parse_delivery_id(&id)?;

    let detail = state
        .services
        .delivery
        .update_status(id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

// Request DTOs

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SaveDeliveryRequest {
    pub customer_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub district: String,
    pub delivery_type: DeliveryType,
    pub delivery_service: Carrier,
    pub amount: Decimal,
    pub delivery_charge: Decimal,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateDeliveryStatusRequest {
    pub status: DeliveryStatus,
}
