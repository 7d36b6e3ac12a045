pub mod bank_slip;
pub mod cart_item;
pub mod delivery_detail;
pub mod order;
pub mod wishlist_item;

// Re-export entities
pub use bank_slip::{BankSlipStatus, Entity as BankSlip, Model as BankSlipModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use delivery_detail::{
    DeliveryService, DeliveryStatus, DeliveryType, Entity as DeliveryDetail,
    Model as DeliveryDetailModel,
};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use wishlist_item::{Entity as WishlistItem, Model as WishlistItemModel, WishlistPriority};
