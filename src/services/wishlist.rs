use crate::{
    entities::wishlist_item::{
        self, Entity as WishlistItem, Model as WishlistItemModel, WishlistPriority,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::cart::{AddCartItemInput, CartService},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Wishlist store. One entry per (owner, product); duplicates are a
/// conflict, not an upsert.
#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    cart_service: Arc<CartService>,
}

impl WishlistService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        cart_service: Arc<CartService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            cart_service,
        }
    }

    /// Adds a product to the owner's wishlist.
    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn add_item(
        &self,
        owner_id: Uuid,
        input: AddWishlistItemInput,
    ) -> Result<WishlistItemModel, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name is required".to_string(),
            ));
        }
        if input.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must be greater than zero".to_string(),
            ));
        }

        let existing = WishlistItem::find()
            .filter(wishlist_item::Column::OwnerId.eq(owner_id))
            .filter(wishlist_item::Column::ProductRef.eq(input.product_ref))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Item already in wishlist".to_string(),
            ));
        }

        let item_id = Uuid::new_v4();
        let item = wishlist_item::ActiveModel {
            id: Set(item_id),
            owner_id: Set(owner_id),
            product_ref: Set(input.product_ref),
            name: Set(input.name),
            price: Set(input.price),
            image_ref: Set(input.image_ref),
            description: Set(input.description),
            category: Set(input.category),
            priority: Set(input.priority.unwrap_or(WishlistPriority::Medium)),
            created_at: Set(Utc::now()),
        };

        // The unique (owner, product) index backs up the pre-check under
        // concurrent adds
        let item = item.insert(&*self.db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                ServiceError::Conflict("Item already in wishlist".to_string())
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        self.event_sender
            .send_or_log(Event::WishlistItemAdded { owner_id, item_id })
            .await;

        info!("Added wishlist item {} for owner {}", item_id, owner_id);
        Ok(item)
    }

    /// Lists the owner's wishlist ordered by priority (High first), then by
    /// recency within each priority band.
    pub async fn list_items(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<WishlistItemModel>, ServiceError> {
        let mut items = WishlistItem::find()
            .filter(wishlist_item::Column::OwnerId.eq(owner_id))
            .order_by_desc(wishlist_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        items.sort_by_key(|item| item.priority.rank());
        Ok(items)
    }

    /// Removes one owned wishlist entry.
    #[instrument(skip(self), fields(owner_id = %owner_id, item_id = %item_id))]
    pub async fn remove_item(&self, owner_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let result = WishlistItem::delete_many()
            .filter(wishlist_item::Column::Id.eq(item_id))
            .filter(wishlist_item::Column::OwnerId.eq(owner_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Wishlist item {} not found",
                item_id
            )));
        }
        Ok(())
    }

    /// Moves a wishlist entry into the cart.
    ///
    /// The cart insert happens first and the wishlist delete second, with no
    /// transaction: a failed delete leaves the wishlist entry in place so a
    /// retry duplicates at worst (at-least-once, never lost).
    #[instrument(skip(self), fields(owner_id = %owner_id, item_id = %item_id))]
    pub async fn move_to_cart(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
    ) -> Result<crate::entities::CartItemModel, ServiceError> {
        let wishlist_item = WishlistItem::find_by_id(item_id)
            .filter(wishlist_item::Column::OwnerId.eq(owner_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Wishlist item {} not found", item_id))
            })?;

        let cart_item = self
            .cart_service
            .add_item(
                owner_id,
                AddCartItemInput {
                    product_name: wishlist_item.name.clone(),
                    unit_price: wishlist_item.price,
                    image_ref: wishlist_item.image_ref.clone(),
                    quantity: Some(1),
                    created_by: None,
                },
            )
            .await?;

        WishlistItem::delete_by_id(item_id).exec(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::WishlistItemMovedToCart { owner_id, item_id })
            .await;

        info!(
            "Moved wishlist item {} to cart as {} for owner {}",
            item_id, cart_item.id, owner_id
        );
        Ok(cart_item)
    }
}

/// Input for adding a wishlist entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AddWishlistItemInput {
    pub product_ref: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_ref: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<WishlistPriority>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rank_orders_high_first() {
        let mut priorities = vec![
            WishlistPriority::Low,
            WishlistPriority::High,
            WishlistPriority::Medium,
        ];
        priorities.sort_by_key(|p| p.rank());
        assert_eq!(
            priorities,
            vec![
                WishlistPriority::High,
                WishlistPriority::Medium,
                WishlistPriority::Low
            ]
        );
    }

    #[test]
    fn priority_defaults_to_medium() {
        let json = r#"{
            "product_ref": "550e8400-e29b-41d4-a716-446655440000",
            "name": "Dark chocolate",
            "price": "3.75",
            "image_ref": "img/choc.png"
        }"#;
        let input: AddWishlistItemInput = serde_json::from_str(json).unwrap();
        assert_eq!(
            input.priority.unwrap_or(WishlistPriority::Medium),
            WishlistPriority::Medium
        );
    }
}
