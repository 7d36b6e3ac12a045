use crate::{errors::ServiceError, services::orders, AppState};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Processor event type that settles an order.
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Asynchronous payment notification endpoint.
///
/// The payload is authenticated with the shared signing secret before any
/// state is read; a bad signature is rejected with zero side effects. After
/// that point the contract flips: the notifier must not be made to retry, so
/// unmatched orders and storage failures are logged and acknowledged.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Notification accepted"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let secret = state
        .config
        .payment
        .webhook_secret
        .as_deref()
        .ok_or_else(|| {
            warn!("Webhook received but no signing secret is configured");
            ServiceError::Unauthorized("webhook signing is not configured".to_string())
        })?;

    let tolerance = state.config.payment.webhook_tolerance_secs;
    if !verify_signature(&headers, &body, secret, tolerance) {
        warn!("Payment webhook signature verification failed");
        return Err(ServiceError::Unauthorized(
            "invalid webhook signature".to_string(),
        ));
    }

    let json: Value = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("invalid json: {}", e)))?;

    // Replay suppression by event id, best effort; the status check in the
    // order store is what actually guarantees idempotency
    if let Some(event_id) = json.get("id").and_then(|v| v.as_str()) {
        let key = format!("wh:{}", event_id);
        if let Ok(mut conn) = state.redis.get_async_connection().await {
            let fresh: Result<bool, _> = redis::cmd("SET")
                .arg(&key)
                .arg("1")
                .arg("NX")
                .arg("EX")
                .arg(24 * 3600)
                .query_async(&mut conn)
                .await;
            if let Ok(false) = fresh {
                info!("Webhook event {} already processed", event_id);
                return Ok((StatusCode::OK, "ok"));
            }
        }
    }

    let event_type = json.get("type").and_then(|v| v.as_str()).unwrap_or("");
    match event_type {
        CHECKOUT_COMPLETED => handle_checkout_completed(&state, &json).await,
        other => {
            info!("Unhandled payment webhook type: {}", other);
        }
    }

    Ok((StatusCode::OK, "ok"))
}

async fn handle_checkout_completed(state: &AppState, json: &Value) {
    let session = json
        .pointer("/data/object")
        .cloned()
        .unwrap_or(Value::Null);

    let Some(order_number) = session
        .pointer("/metadata/order_number")
        .and_then(|v| v.as_str())
    else {
        warn!("Completed-checkout event carries no order_number metadata");
        return;
    };

    let Some(owner_id) = session
        .pointer("/metadata/owner_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
    else {
        warn!(
            "Completed-checkout event for {} carries no usable owner_id",
            order_number
        );
        return;
    };

    let payment_status = session
        .get("payment_status")
        .and_then(|v| v.as_str())
        .unwrap_or(orders::PAYMENT_PAID);
    let payment_intent = session
        .get("payment_intent")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    // Failures past the signature check are logged for manual reconciliation
    // and still acknowledged, so the notifier does not redeliver forever
    if let Err(e) = state
        .services
        .checkout
        .apply_completed_notification(order_number, owner_id, payment_status, payment_intent)
        .await
    {
        error!(
            "Failed applying completed notification for {}: {}",
            order_number, e
        );
    }
}

/// Verifies the webhook signature.
///
/// Two header forms are accepted: generic `x-timestamp`/`x-signature`, and
/// `Stripe-Signature` with `t=`/`v1=` parts. Both sign
/// `"{timestamp}.{payload}"` with HMAC-SHA256; timestamps outside the
/// tolerance window fail.
pub fn verify_signature(
    headers: &HeaderMap,
    payload: &Bytes,
    secret: &str,
    tolerance_secs: u64,
) -> bool {
    if let (Some(ts), Some(sig)) = (headers.get("x-timestamp"), headers.get("x-signature")) {
        if let (Ok(ts), Ok(sig)) = (ts.to_str(), sig.to_str()) {
            if !timestamp_within_tolerance(ts, tolerance_secs) {
                return false;
            }
            return signature_matches(ts, payload, secret, sig);
        }
    }

    if let Some(sig) = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
    {
        let mut ts = "";
        let mut v1 = "";
        for part in sig.split(',') {
            let mut it = part.trim().split('=');
            match (it.next(), it.next()) {
                (Some("t"), Some(val)) => ts = val,
                (Some("v1"), Some(val)) => v1 = val,
                _ => {}
            }
        }
        if !ts.is_empty() && !v1.is_empty() {
            if !timestamp_within_tolerance(ts, tolerance_secs) {
                return false;
            }
            return signature_matches(ts, payload, secret, v1);
        }
    }

    false
}

fn timestamp_within_tolerance(ts: &str, tolerance_secs: u64) -> bool {
    match ts.parse::<i64>() {
        Ok(ts) => {
            let now = chrono::Utc::now().timestamp();
            (now - ts).unsigned_abs() <= tolerance_secs
        }
        Err(_) => false,
    }
}

fn signature_matches(ts: &str, payload: &Bytes, secret: &str, provided: &str) -> bool {
    let signed = format!("{}.{}", ts, std::str::from_utf8(payload).unwrap_or(""));
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(signed.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, provided)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
