use crate::{config::PaymentConfig, entities::order::OrderLine, errors::ServiceError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Metadata keys embedded in every checkout session so asynchronous
/// notifications can be correlated back to an order and its owner.
pub const META_ORDER_NUMBER: &str = "order_number";
pub const META_OWNER_ID: &str = "owner_id";
pub const META_DELIVERY_DETAIL_ID: &str = "delivery_detail_id";

/// REST client for the hosted-checkout payment processor.
///
/// The processor hosts the card UI; we create a session, hand the client its
/// redirect URL, and later read the session back (or receive a webhook) to
/// learn the outcome.
#[derive(Clone)]
pub struct PaymentGateway {
    http: reqwest::Client,
    config: PaymentConfig,
}

/// Checkout session as returned by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_intent: Option<String>,
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Whether the processor reports this session as settled.
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

impl PaymentGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    pub fn min_charge_minor_units(&self) -> i64 {
        self.config.min_charge_minor_units
    }

    /// Creates a hosted checkout session listing every order line, with the
    /// order correlation ids in session metadata.
    #[instrument(skip(self, lines), fields(order_number = %order_number))]
    pub async fn create_checkout_session(
        &self,
        order_number: &str,
        owner_id: Uuid,
        delivery_detail_id: Uuid,
        lines: &[OrderLine],
    ) -> Result<CheckoutSession, ServiceError> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "success_url".to_string(),
                self.config.success_url.clone(),
            ),
            ("cancel_url".to_string(), self.config.cancel_url.clone()),
            (
                format!("metadata[{}]", META_ORDER_NUMBER),
                order_number.to_string(),
            ),
            (
                format!("metadata[{}]", META_OWNER_ID),
                owner_id.to_string(),
            ),
            (
                format!("metadata[{}]", META_DELIVERY_DETAIL_ID),
                delivery_detail_id.to_string(),
            ),
            (
                "payment_method_types[0]".to_string(),
                "card".to_string(),
            ),
        ];
        params.extend(line_item_params(lines, &self.config.currency)?);

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("checkout session request: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "processor rejected checkout session");
            return Err(ServiceError::ExternalServiceError(format!(
                "processor returned {}: {}",
                status, body
            )));
        }

        response.json::<CheckoutSession>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("checkout session decode: {}", e))
        })
    }

    /// Reads a session back to learn its payment outcome.
    #[instrument(skip(self))]
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, ServiceError> {
        let response = self
            .http
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.config.api_base, session_id
            ))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("session lookup request: {}", e))
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(format!(
                "Checkout session {} not found",
                session_id
            )));
        }
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "processor returned {}",
                response.status()
            )));
        }

        response.json::<CheckoutSession>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("session decode: {}", e))
        })
    }
}

/// Converts a decimal major-unit amount into the processor's integer minor
/// units (e.g. 5.00 → 500).
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| {
            ServiceError::BadRequest(format!("Amount {} is not representable", amount))
        })
}

fn line_item_params(
    lines: &[OrderLine],
    currency: &str,
) -> Result<Vec<(String, String)>, ServiceError> {
    let mut params = Vec::with_capacity(lines.len() * 4);
    for (i, line) in lines.iter().enumerate() {
        params.push((
            format!("line_items[{}][price_data][currency]", i),
            currency.to_string(),
        ));
        params.push((
            format!("line_items[{}][price_data][product_data][name]", i),
            line.name.clone(),
        ));
        params.push((
            format!("line_items[{}][price_data][unit_amount]", i),
            to_minor_units(line.unit_price)?.to_string(),
        ));
        params.push((
            format!("line_items[{}][quantity]", i),
            line.quantity.to_string(),
        ));
    }
    Ok(params)
}
