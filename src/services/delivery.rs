use crate::{
    entities::delivery_detail::{
        self, DeliveryService as Carrier, DeliveryStatus, DeliveryType,
        Entity as DeliveryDetail, Model as DeliveryDetailModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,14}$").expect("valid phone regex"));

/// Delivery-details store. The derived `total_amount` is recomputed on every
/// save; whatever the client sends for it is discarded.
#[derive(Clone)]
pub struct DeliveryDetailsService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DeliveryDetailsService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Persists a delivery record for the owner.
    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn save(
        &self,
        owner_id: Uuid,
        input: SaveDeliveryDetailInput,
    ) -> Result<DeliveryDetailModel, ServiceError> {
        if input.customer_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Customer name is required".to_string(),
            ));
        }
        if !PHONE_RE.is_match(input.phone.trim()) {
            return Err(ServiceError::ValidationError(
                "Phone number is not valid".to_string(),
            ));
        }
        if !input.email.contains('@') {
            return Err(ServiceError::ValidationError(
                "Email address is not valid".to_string(),
            ));
        }
        if input.amount < Decimal::ZERO || input.delivery_charge < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Amounts cannot be negative".to_string(),
            ));
        }

        // Derived server-side, always
        let total_amount = input.amount + input.delivery_charge;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let detail = delivery_detail::ActiveModel {
            id: Set(id),
            owner_id: Set(owner_id),
            customer_name: Set(input.customer_name),
            phone: Set(input.phone),
            email: Set(input.email),
            address: Set(input.address),
            postal_code: Set(input.postal_code),
            district: Set(input.district),
            delivery_type: Set(input.delivery_type),
            delivery_service: Set(input.delivery_service),
            amount: Set(input.amount),
            delivery_charge: Set(input.delivery_charge),
            total_amount: Set(total_amount),
            status: Set(DeliveryStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let detail = detail.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::DeliveryDetailSaved(id))
            .await;

        info!("Saved delivery detail {} for owner {}", id, owner_id);
        Ok(detail)
    }

    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<DeliveryDetailModel>, ServiceError> {
        Ok(DeliveryDetail::find()
            .filter(delivery_detail::Column::OwnerId.eq(owner_id))
            .order_by_desc(delivery_detail::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<DeliveryDetailModel, ServiceError> {
        DeliveryDetail::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Delivery detail {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = DeliveryDetail::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Delivery detail {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Admin dashboard listing.
    pub async fn list_all(&self) -> Result<Vec<DeliveryDetailModel>, ServiceError> {
        Ok(DeliveryDetail::find()
            .order_by_desc(delivery_detail::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Admin dashboard: cancelled deliveries only.
    pub async fn list_cancelled(&self) -> Result<Vec<DeliveryDetailModel>, ServiceError> {
        Ok(DeliveryDetail::find()
            .filter(delivery_detail::Column::Status.eq(DeliveryStatus::Cancelled))
            .order_by_desc(delivery_detail::Column::UpdatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Admin status transition (Pending → PickedUp → OutForDelivery →
    /// Delivered, or Cancelled at any point before Delivered).
    #[instrument(skip(self), fields(delivery_id = %id))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
    ) -> Result<DeliveryDetailModel, ServiceError> {
        let detail = self.get_by_id(id).await?;
        let old_status = detail.status;

        if old_status == DeliveryStatus::Delivered && status != DeliveryStatus::Delivered {
            return Err(ServiceError::BadRequest(
                "A delivered record cannot change status".to_string(),
            ));
        }

        let mut active: delivery_detail::ActiveModel = detail.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::DeliveryStatusChanged {
                delivery_id: id,
                old_status: old_status.to_string(),
                new_status: status.to_string(),
            })
            .await;

        Ok(updated)
    }
}

/// Input for saving a delivery record. No `total_amount` field exists here
/// on purpose.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveDeliveryDetailInput {
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
