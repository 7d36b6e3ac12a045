use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{
    entities::bank_slip::BankSlipStatus, errors::ApiError, services::bank_slips, AppState,
};
use axum::{
    extract::{DefaultBodyLimit, Json, Multipart, Path, State},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Creates the router for slip upload (authenticated users)
pub fn bank_slip_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(upload_bank_slip)).layer(
        // Slips may be up to 10 MiB; leave headroom for multipart framing
        DefaultBodyLimit::max(bank_slips::MAX_SLIP_BYTES + 64 * 1024),
    )
}

/// Creates the router for slip review (admin)
pub fn bank_slip_admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_bank_slips))
        .route("/:id", get(get_bank_slip))
        .route("/:id/status", put(update_bank_slip_status))
}

/// Upload payment evidence for an order.
///
/// Multipart form with a `bank_slip` file part (JPEG/PNG/PDF, ≤ 10 MiB) and
/// an `order_number` text part.
#[utoipa::path(
    post,
    path = "/api/v1/bank-slips",
    responses(
        (status = 201, description = "Slip stored, pending review"),
        (status = 400, description = "Missing file, bad type, or oversize", body = crate::errors::ErrorResponse)
    ),
    tag = "Bank slips"
)]
pub async fn upload_bank_slip(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let mut order_number: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("order_number") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("invalid order_number: {}", e)))?;
                order_number = Some(value);
            }
            Some("bank_slip") => {
                let file_name = field.file_name().unwrap_or("slip").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("invalid file upload: {}", e)))?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let order_number =
        order_number.ok_or_else(|| ApiError::BadRequest("order_number is required".to_string()))?;
    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let slip = state
        .services
        .bank_slips
        .store_slip(&order_number, &file_name, &bytes)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(slip))
}

/// Admin: list every uploaded slip
#[utoipa::path(
    get,
    path = "/api/v1/bank-slips",
    responses((status = 200, description = "All bank slips")),
    tag = "Bank slips"
)]
pub async fn list_bank_slips(
    State(state): State<Arc<AppState>>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let slips = state
        .services
        .bank_slips
        .list()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(slips))
}

/// Admin: fetch one slip
#[utoipa::path(
    get,
    path = "/api/v1/bank-slips/{id}",
    responses(
        (status = 200, description = "Bank slip"),
        (status = 404, description = "No such slip", body = crate::errors::ErrorResponse)
    ),
    tag = "Bank slips"
)]
pub async fn get_bank_slip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let slip = state
        .services
        .bank_slips
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(slip))
}

/// Admin: approve or reject a slip. The linked order is not touched here;
/// settling it is a separate manual step.
#[utoipa::path(
    put,
    path = "/api/v1/bank-slips/{id}/status",
    responses(
        (status = 200, description = "Status updated"),
        (status = 404, description = "No such slip", body = crate::errors::ErrorResponse)
    ),
    tag = "Bank slips"
)]
pub async fn update_bank_slip_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSlipStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let slip = state
        .services
        .bank_slips
        .set_status(id, payload.status)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(slip))
}

// Request DTOs

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateSlipStatusRequest {
    pub status: BankSlipStatus,
}
