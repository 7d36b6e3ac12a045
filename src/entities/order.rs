use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order aggregate.
///
/// `order_number` is the business key quoted to the payment processor and
/// embedded in webhook metadata; it is distinct from the storage id.
/// `items` is a by-value JSON snapshot of the cart at creation time, so
/// later cart mutations cannot reach into a submitted order.
/// `payment_status` is a processor-defined string; the order lifecycle
/// itself is the typed `status` column.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub owner_id: Uuid,
    pub delivery_detail_id: Uuid,
    #[sea_orm(column_type = "Json")]
    pub items: Json,
    pub payment_status: String,
    #[sea_orm(nullable)]
    pub payment_intent_ref: Option<String>,
    #[sea_orm(nullable)]
    pub checkout_session_ref: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delivery_detail::Entity",
        from = "Column::DeliveryDetailId",
        to = "super::delivery_detail::Column::Id"
    )]
    DeliveryDetail,
}

impl Related<super::delivery_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle. `Pending` waits on the processor; `Processing` covers
/// offline methods awaiting collection or manual slip verification;
/// `Expired` is applied by the staleness sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// One snapshotted line inside `Model::items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}
