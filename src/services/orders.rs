use crate::{
    entities::order::{self, Entity as OrderEntity, Model as OrderModel, OrderLine, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Payment-status strings persisted on orders. `pending`/`paid`/`failed`
/// mirror the processor's vocabulary; the offline-method values are ours.
pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_PAID: &str = "paid";
pub const PAYMENT_FAILED: &str = "failed";
pub const PAYMENT_COLLECT_ON_DELIVERY: &str = "collect_on_delivery";
pub const PAYMENT_AWAITING_VERIFICATION: &str = "awaiting_verification";

/// Outcome of a completion attempt. A repeat notification for an
/// already-completed order is reported, not re-applied.
#[derive(Debug)]
pub enum CompletionOutcome {
    Updated(OrderModel),
    AlreadyCompleted(OrderModel),
}

/// Order store. Orders are created by the checkout orchestrator, completed
/// by the payment confirmation paths, and expired by the staleness sweep;
/// normal flow never deletes one.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Parameters for creating an order row.
#[derive(Debug)]
pub struct CreateOrderParams {
    pub owner_id: Uuid,
    pub delivery_detail_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: String,
    pub checkout_session_ref: Option<String>,
    pub idempotency_key: String,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Derives the externally-quoted business order number.
    pub fn order_number_from(id: Uuid) -> String {
        format!("ORD-{}", id.to_string()[..8].to_uppercase())
    }

    /// Persists a new order with a by-value snapshot of its lines.
    #[instrument(skip(self, params), fields(owner_id = %params.owner_id))]
    pub async fn create_order(
        &self,
        params: CreateOrderParams,
    ) -> Result<OrderModel, ServiceError> {
        if params.lines.is_empty() {
            return Err(ServiceError::BadRequest(
                "An order requires at least one line item".to_string(),
            ));
        }

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let items = serde_json::to_value(&params.lines)
            .map_err(|e| ServiceError::InternalError(format!("snapshot encode: {}", e)))?;

        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(Self::order_number_from(order_id)),
            owner_id: Set(params.owner_id),
            delivery_detail_id: Set(params.delivery_detail_id),
            items: Set(items),
            payment_status: Set(params.payment_status),
            payment_intent_ref: Set(None),
            checkout_session_ref: Set(params.checkout_session_ref),
            total_amount: Set(params.total_amount),
            status: Set(params.status),
            idempotency_key: Set(params.idempotency_key),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let order = order.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        info!(
            "Created order {} ({:?}) for owner {}",
            order.order_number, order.status, order.owner_id
        );
        Ok(order)
    }

    pub async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderModel>, ServiceError> {
        Ok(OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?)
    }

    /// Resubmitted checkouts resolve through this lookup to their original
    /// order instead of creating a duplicate.
    pub async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<OrderModel>, ServiceError> {
        Ok(OrderEntity::find()
            .filter(order::Column::IdempotencyKey.eq(key))
            .one(&*self.db)
            .await?)
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<OrderModel>, ServiceError> {
        Ok(OrderEntity::find()
            .filter(order::Column::OwnerId.eq(owner_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn list_completed_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        Ok(OrderEntity::find()
            .filter(order::Column::OwnerId.eq(owner_id))
            .filter(order::Column::Status.eq(OrderStatus::Completed))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Completes an order exactly once.
    ///
    /// The confirmation call and the webhook may arrive in either order, or
    /// both; the current-status check makes the second arrival a no-op.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn mark_completed(
        &self,
        order_number: &str,
        payment_status: &str,
        payment_intent_ref: Option<String>,
    ) -> Result<CompletionOutcome, ServiceError> {
        let order = self
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", order_number))
            })?;

        if order.status == OrderStatus::Completed {
            info!("Order {} already completed; skipping", order_number);
            return Ok(CompletionOutcome::AlreadyCompleted(order));
        }

        let order_id = order.id;
        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Completed);
        active.payment_status = Set(payment_status.to_string());
        if payment_intent_ref.is_some() {
            active.payment_intent_ref = Set(payment_intent_ref);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderCompleted(order_id))
            .await;
        Ok(CompletionOutcome::Updated(updated))
    }

    /// Records an explicit payment failure. The order stays in its current
    /// lifecycle state so the client can retry the payment.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn mark_payment_failed(
        &self,
        order_number: &str,
    ) -> Result<OrderModel, ServiceError> {
        let order = self
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", order_number))
            })?;

        if order.status == OrderStatus::Completed {
            // A settled order never regresses on a late failure signal
            return Ok(order);
        }

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PAYMENT_FAILED.to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PaymentFailed {
                order_number: order_number.to_string(),
            })
            .await;
        Ok(updated)
    }

    /// Marks pending orders older than `max_age` as expired. Driven by the
    /// periodic sweep spawned at startup; abandoned hosted checkouts
    /// otherwise stay pending forever.
    #[instrument(skip(self))]
    pub async fn expire_stale_pending(&self, max_age: Duration) -> Result<u64, ServiceError> {
        let cutoff = Utc::now() - max_age;
        let stale = OrderEntity::find()
            .filter(order::Column::Status.eq(OrderStatus::Pending))
            .filter(order::Column::CreatedAt.lt(cutoff))
            .all(&*self.db)
            .await?;

        let mut expired = 0u64;
        for order in stale {
            let order_id = order.id;
            let mut active: order::ActiveModel = order.into();
            active.status = Set(OrderStatus::Expired);
            active.updated_at = Set(Utc::now());
            active.update(&*self.db).await?;

            self.event_sender
                .send_or_log(Event::OrderExpired(order_id))
                .await;
            expired += 1;
        }

        if expired > 0 {
            warn!("Expired {} stale pending order(s)", expired);
        }
        Ok(expired)
    }

    /// Decodes the immutable line snapshot of an order.
    pub fn lines_of(order: &OrderModel) -> Result<Vec<OrderLine>, ServiceError> {
        serde_json::from_value(order.items.clone())
            .map_err(|e| ServiceError::InternalError(format!("snapshot decode: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_number_uses_uuid_prefix() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(OrderService::order_number_from(id), "ORD-550E8400");
    }

    #[test]
    fn order_numbers_differ_per_order() {
        assert_ne!(
            OrderService::order_number_from(Uuid::new_v4()),
            OrderService::order_number_from(Uuid::new_v4())
        );
    }

    #[test]
    fn line_snapshot_round_trips_through_json() {
        let lines = vec![
            OrderLine {
                name: "Mango".to_string(),
                unit_price: dec!(5.00),
                quantity: 2,
            },
            OrderLine {
                name: "Fudge".to_string(),
                unit_price: dec!(3.25),
                quantity: 1,
            },
        ];

        let json = serde_json::to_value(&lines).unwrap();
        let decoded: Vec<OrderLine> = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, lines);
    }
}
