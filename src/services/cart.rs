use crate::{
    entities::cart_item::{self, Entity as CartItem, Model as CartItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Cart store. Every operation is scoped to the owning user; line items are
/// identified by a generated uuid that doubles as the storage key.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a line item for the owner. Quantity defaults to 1.
    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn add_item(
        &self,
        owner_id: Uuid,
        input: AddCartItemInput,
    ) -> Result<CartItemModel, ServiceError> {
        if input.product_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name is required".to_string(),
            ));
        }
        if input.unit_price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Unit price must be greater than zero".to_string(),
            ));
        }
        let quantity = input.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let item_id = Uuid::new_v4();
        let now = Utc::now();
        let item = cart_item::ActiveModel {
            id: Set(item_id),
            owner_id: Set(owner_id),
            product_name: Set(input.product_name),
            unit_price: Set(input.unit_price),
            image_ref: Set(input.image_ref),
            quantity: Set(quantity),
            created_by: Set(input.created_by.clone()),
            updated_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let item = item.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded { owner_id, item_id })
            .await;

        info!("Added cart item {} for owner {}", item_id, owner_id);
        Ok(item)
    }

    /// Returns every line item for the owner. An empty cart is a valid,
    /// non-error result.
    pub async fn list_items(&self, owner_id: Uuid) -> Result<Vec<CartItemModel>, ServiceError> {
        Ok(CartItem::find()
            .filter(cart_item::Column::OwnerId.eq(owner_id))
            .all(&*self.db)
            .await?)
    }

    /// Sets the quantity of an owned line item. Quantities below 1 are
    /// rejected; the store never holds a non-positive quantity.
    #[instrument(skip(self), fields(owner_id = %owner_id, item_id = %item_id))]
    pub async fn update_quantity(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartItemModel, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let item = CartItem::find_by_id(item_id)
            .filter(cart_item::Column::OwnerId.eq(owner_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(quantity);
        item.updated_at = Set(Utc::now());
        Ok(item.update(&*self.db).await?)
    }

    /// Removes one owned line item.
    #[instrument(skip(self), fields(owner_id = %owner_id, item_id = %item_id))]
    pub async fn remove_item(&self, owner_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::Id.eq(item_id))
            .filter(cart_item::Column::OwnerId.eq(owner_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Cart item {} not found",
                item_id
            )));
        }

        self.event_sender
            .send_or_log(Event::CartItemRemoved { owner_id, item_id })
            .await;
        Ok(())
    }

    /// Deletes every line item for the owner. Idempotent: clearing an empty
    /// cart is a no-op, not an error. Used after payment settles.
    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn clear_for_owner(&self, owner_id: Uuid) -> Result<u64, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::OwnerId.eq(owner_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            self.event_sender
                .send_or_log(Event::CartCleared { owner_id })
                .await;
            info!(
                "Cleared {} cart item(s) for owner {}",
                result.rows_affected, owner_id
            );
        }
        Ok(result.rows_affected)
    }
}

/// Input for adding a cart line item.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItemInput {
    pub product_name: String,
    pub unit_price: Decimal,
    pub image_ref: String,
    pub quantity: Option<i32>,
    pub created_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(name: &str, price: Decimal, quantity: Option<i32>) -> AddCartItemInput {
        AddCartItemInput {
            product_name: name.to_string(),
            unit_price: price,
            image_ref: "img/mango.png".to_string(),
            quantity,
            created_by: None,
        }
    }

    #[test]
    fn add_input_deserializes_without_quantity() {
        let json = r#"{
            "product_name": "Mango",
            "unit_price": "5.00",
            "image_ref": "img/mango.png"
        }"#;

        let parsed: AddCartItemInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.product_name, "Mango");
        assert_eq!(parsed.unit_price, dec!(5.00));
        assert!(parsed.quantity.is_none());
    }

    #[test]
    fn quantity_defaults_to_one() {
        let parsed = input("Mango", dec!(5), None);
        assert_eq!(parsed.quantity.unwrap_or(1), 1);
    }

    #[test]
    fn line_total_arithmetic() {
        let unit_price = dec!(2.50);
        let quantity = 4;
        assert_eq!(unit_price * Decimal::from(quantity), dec!(10.00));
    }
}
