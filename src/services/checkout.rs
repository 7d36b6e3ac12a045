use crate::{
    entities::order::{Model as OrderModel, OrderLine, OrderStatus},
    entities::CartItemModel,
    errors::ServiceError,
    services::{
        cart::CartService,
        delivery::DeliveryDetailsService,
        orders::{
            self, CompletionOutcome, CreateOrderParams, OrderService,
        },
        payments::{self, PaymentGateway},
    },
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// How the customer pays. Online goes through the hosted processor; the
/// other two settle outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Online,
    CashOnDelivery,
    BankSlip,
}

/// Input for starting a checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct StartCheckoutInput {
    pub delivery_detail_id: Uuid,
    pub payment_method: PaymentMethod,
    /// Client-generated token; a resubmission with the same token returns
    /// the original order instead of creating a second one.
    pub idempotency_key: String,
}

/// Result of a checkout attempt.
#[derive(Debug, Serialize)]
pub struct CheckoutOutcome {
    pub order: OrderModel,
    /// Hosted-checkout session id (online payments only)
    pub session_id: Option<String>,
    /// Where to send the customer to pay (online payments only)
    pub redirect_url: Option<String>,
    /// True when this response replays a previously-submitted checkout
    pub replayed: bool,
}

/// Checkout orchestrator: turns the owner's cart plus a delivery choice into
/// exactly one order, and reconciles payment confirmations against it.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    cart_service: Arc<CartService>,
    order_service: Arc<OrderService>,
    delivery_service: Arc<DeliveryDetailsService>,
    gateway: Arc<PaymentGateway>,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cart_service: Arc<CartService>,
        order_service: Arc<OrderService>,
        delivery_service: Arc<DeliveryDetailsService>,
        gateway: Arc<PaymentGateway>,
    ) -> Self {
        Self {
            db,
            cart_service,
            order_service,
            delivery_service,
            gateway,
        }
    }

    /// Starts a checkout for the authenticated owner.
    ///
    /// The cart is read and snapshotted here; the snapshot lives on the
    /// order, so cart edits after this point cannot change what was bought.
    /// The cart itself is cleared immediately for offline methods and only
    /// on confirmation for online payment.
    #[instrument(skip(self, input), fields(owner_id = %owner_id, method = ?input.payment_method))]
    pub async fn start_checkout(
        &self,
        owner_id: Uuid,
        input: StartCheckoutInput,
    ) -> Result<CheckoutOutcome, ServiceError> {
        if input.idempotency_key.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "idempotency_key is required".to_string(),
            ));
        }

        // Replay detection before any side effect
        if let Some(existing) = self
            .order_service
            .find_by_idempotency_key(&input.idempotency_key)
            .await?
        {
            if existing.owner_id != owner_id {
                return Err(ServiceError::Conflict(
                    "Idempotency key already used".to_string(),
                ));
            }
            info!(
                "Replaying checkout for idempotency key; order {}",
                existing.order_number
            );
            let session_id = existing.checkout_session_ref.clone();
            return Ok(CheckoutOutcome {
                order: existing,
                session_id,
                redirect_url: None,
                replayed: true,
            });
        }

        let cart_items = self.cart_service.list_items(owner_id).await?;
        if cart_items.is_empty() {
            return Err(ServiceError::BadRequest("Cart is empty".to_string()));
        }

        let delivery = self
            .delivery_service
            .get_by_id(input.delivery_detail_id)
            .await?;
        if delivery.owner_id != owner_id {
            return Err(ServiceError::NotFound(format!(
                "Delivery detail {} not found",
                input.delivery_detail_id
            )));
        }

        let lines = snapshot_lines(&cart_items);
        let total_amount = order_total(&lines, delivery.delivery_charge);

        if payments::to_minor_units(total_amount)? < self.gateway.min_charge_minor_units() {
            return Err(ServiceError::BadRequest(format!(
                "Order total {} is below the minimum chargeable amount",
                total_amount
            )));
        }

        match input.payment_method {
            PaymentMethod::Online => {
                self.start_online_checkout(owner_id, input, lines, total_amount)
                    .await
            }
            PaymentMethod::CashOnDelivery => {
                self.finalize_offline_checkout(
                    owner_id,
                    input,
                    lines,
                    total_amount,
                    orders::PAYMENT_COLLECT_ON_DELIVERY,
                )
                .await
            }
            PaymentMethod::BankSlip => {
                self.finalize_offline_checkout(
                    owner_id,
                    input,
                    lines,
                    total_amount,
                    orders::PAYMENT_AWAITING_VERIFICATION,
                )
                .await
            }
        }
    }

    async fn start_online_checkout(
        &self,
        owner_id: Uuid,
        input: StartCheckoutInput,
        lines: Vec<OrderLine>,
        total_amount: Decimal,
    ) -> Result<CheckoutOutcome, ServiceError> {
        // The pending order exists before the processor is contacted so a
        // webhook can never race an order that is not yet visible. A failed
        // session call leaves it pending for the expiry sweep.
        let order = self
            .order_service
            .create_order(CreateOrderParams {
                owner_id,
                delivery_detail_id: input.delivery_detail_id,
                lines,
                total_amount,
                status: OrderStatus::Pending,
                payment_status: orders::PAYMENT_PENDING.to_string(),
                checkout_session_ref: None,
                idempotency_key: input.idempotency_key,
            })
            .await?;

        let session = self
            .gateway
            .create_checkout_session(
                &order.order_number,
                owner_id,
                input.delivery_detail_id,
                &OrderService::lines_of(&order)?,
            )
            .await?;

        let mut active: crate::entities::order::ActiveModel = order.into();
        active.checkout_session_ref = Set(Some(session.id.clone()));
        if session.payment_intent.is_some() {
            active.payment_intent_ref = Set(session.payment_intent.clone());
        }
        active.updated_at = Set(chrono::Utc::now());
        let order = active.update(&*self.db).await?;

        info!(
            "Checkout session {} created for order {}",
            session.id, order.order_number
        );
        Ok(CheckoutOutcome {
            order,
            session_id: Some(session.id),
            redirect_url: session.url,
            replayed: false,
        })
    }

    async fn finalize_offline_checkout(
        &self,
        owner_id: Uuid,
        input: StartCheckoutInput,
        lines: Vec<OrderLine>,
        total_amount: Decimal,
        payment_status: &str,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let order = self
            .order_service
            .create_order(CreateOrderParams {
                owner_id,
                delivery_detail_id: input.delivery_detail_id,
                lines,
                total_amount,
                status: OrderStatus::Processing,
                payment_status: payment_status.to_string(),
                checkout_session_ref: None,
                idempotency_key: input.idempotency_key,
            })
            .await?;

        // No confirmation step follows for offline methods
        self.cart_service.clear_for_owner(owner_id).await?;

        Ok(CheckoutOutcome {
            order,
            session_id: None,
            redirect_url: None,
            replayed: false,
        })
    }

    /// Synchronous confirmation: the client returns from the hosted payment
    /// page and asks us to verify the outcome with the processor.
    ///
    /// On success the order completes (idempotently) and the cart clears.
    /// On failure the order stays pending and the client may retry.
    #[instrument(skip(self), fields(owner_id = %owner_id, session_id = %session_id))]
    pub async fn confirm_payment(
        &self,
        owner_id: Uuid,
        session_id: &str,
    ) -> Result<OrderModel, ServiceError> {
        let session = self.gateway.retrieve_checkout_session(session_id).await?;

        if !session.is_paid() {
            return Err(ServiceError::PaymentFailed(format!(
                "Checkout session {} is not paid",
                session_id
            )));
        }

        let order_number = session
            .metadata
            .get(payments::META_ORDER_NUMBER)
            .cloned()
            .ok_or_else(|| {
                ServiceError::BadRequest("Session carries no order reference".to_string())
            })?;

        let order = self
            .order_service
            .find_by_order_number(&order_number)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_number)))?;
        if order.owner_id != owner_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to a different user".to_string(),
            ));
        }

        let payment_status = session
            .payment_status
            .as_deref()
            .unwrap_or(orders::PAYMENT_PAID);
        let outcome = self
            .order_service
            .mark_completed(&order_number, payment_status, session.payment_intent.clone())
            .await?;

        self.cart_service.clear_for_owner(owner_id).await?;

        Ok(match outcome {
            CompletionOutcome::Updated(order) => order,
            CompletionOutcome::AlreadyCompleted(order) => order,
        })
    }

    /// Applies a processor "checkout completed" notification.
    ///
    /// An unknown order number is absorbed (logged, `Ok`) so the notifier
    /// stops retrying an event that can never match; everything else
    /// propagates for the caller to decide how to acknowledge.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn apply_completed_notification(
        &self,
        order_number: &str,
        owner_id: Uuid,
        payment_status: &str,
        payment_intent_ref: Option<String>,
    ) -> Result<(), ServiceError> {
        match self
            .order_service
            .mark_completed(order_number, payment_status, payment_intent_ref)
            .await
        {
            Ok(CompletionOutcome::Updated(_)) => {}
            Ok(CompletionOutcome::AlreadyCompleted(_)) => {
                // Duplicate delivery; the cart was already cleared once
                return Ok(());
            }
            Err(ServiceError::NotFound(_)) => {
                warn!(
                    "No matching order for completed notification: {}",
                    order_number
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.cart_service.clear_for_owner(owner_id).await?;
        Ok(())
    }
}

/// Copies cart items into order lines. This is the snapshot boundary: the
/// order keeps these values even if the cart rows change afterwards.
pub fn snapshot_lines(items: &[CartItemModel]) -> Vec<OrderLine> {
    items
        .iter()
        .map(|item| OrderLine {
            name: item.product_name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
        })
        .collect()
}

/// Order total: line totals plus the delivery charge.
pub fn order_total(lines: &[OrderLine], delivery_charge: Decimal) -> Decimal {
    let items_total: Decimal = lines
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum();
    items_total + delivery_charge
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn cart_item(name: &str, price: Decimal, quantity: i32) -> CartItemModel {
        CartItemModel {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            product_name: name.to_string(),
            unit_price: price,
            image_ref: "img".to_string(),
            quantity,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_copies_values() {
        let mut items = vec![cart_item("Mango", dec!(10), 2)];
        let lines = snapshot_lines(&items);

        // Mutating the cart row after the snapshot leaves the lines alone
        items[0].quantity = 5;
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].unit_price, dec!(10));
    }

    #[test]
    fn total_sums_lines_and_delivery_charge() {
        let lines = snapshot_lines(&[
            cart_item("Mango", dec!(5), 3),
            cart_item("Toffee", dec!(1.25), 4),
        ]);
        assert_eq!(order_total(&lines, dec!(2.50)), dec!(22.50));
    }

    #[test]
    fn total_with_no_delivery_charge() {
        let lines = snapshot_lines(&[cart_item("Mango", dec!(5), 3)]);
        assert_eq!(order_total(&lines, Decimal::ZERO), dec!(15));
    }

    #[test]
    fn payment_method_deserializes_snake_case() {
        assert_eq!(
            serde_json::from_str::<PaymentMethod>(r#""cash_on_delivery""#).unwrap(),
            PaymentMethod::CashOnDelivery
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>(r#""online""#).unwrap(),
            PaymentMethod::Online
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>(r#""bank_slip""#).unwrap(),
            PaymentMethod::BankSlip
        );
    }

    #[test]
    fn start_input_requires_key_field() {
        let json = r#"{
            "delivery_detail_id": "550e8400-e29b-41d4-a716-446655440000",
            "payment_method": "online"
        }"#;
        // Missing idempotency_key is a deserialization error, not a silent default
        assert!(serde_json::from_str::<StartCheckoutInput>(json).is_err());
    }
}
