use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    services::checkout::{PaymentMethod, StartCheckoutInput},
    AppState,
};
use axum::{
    extract::{Extension, Json, State},
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", post(create_checkout_session))
        .route("/confirm", post(confirm_payment))
}

/// Start a checkout for the caller's cart.
///
/// Online payment returns a hosted-session id and redirect URL and leaves
/// the cart alone until confirmation; cash and bank-slip orders finalize
/// immediately and clear the cart.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/session",
    responses(
        (status = 200, description = "Checkout started; body carries the order and, for online payment, the session id and redirect URL"),
        (status = 400, description = "Empty cart, missing delivery detail, or sub-minimum total", body = crate::errors::ErrorResponse),
        (status = 409, description = "Idempotency key already used by another user", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment processor unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn create_checkout_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateCheckoutSessionRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = StartCheckoutInput {
        delivery_detail_id: payload.delivery_detail_id,
        payment_method: payload.payment_method,
        idempotency_key: payload.idempotency_key,
    };

    let outcome = state
        .services
        .checkout
        .start_checkout(user.user_id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(outcome))
}

/// Synchronously confirm a hosted payment after the client returns from the
/// processor. Idempotent against the webhook having arrived first.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/confirm",
    responses(
        (status = 200, description = "Order completed and cart cleared"),
        (status = 402, description = "Session not paid; the order stays pending and the call may be retried", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown session or order", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    if payload.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest("session_id is required".to_string()));
    }

    let order = state
        .services
        .checkout
        .confirm_payment(user.user_id, &payload.session_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateCheckoutSessionRequest {
    pub delivery_detail_id: Uuid,
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 128))]
    pub idempotency_key: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ConfirmPaymentRequest {
    pub session_id: String,
}
