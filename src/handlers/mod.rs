pub mod bank_slips;
pub mod carts;
pub mod checkout;
pub mod common;
pub mod deliveries;
pub mod orders;
pub mod payment_webhooks;
pub mod wishlists;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub cart: Arc<crate::services::CartService>,
    pub wishlist: Arc<crate::services::wishlist::WishlistService>,
    pub delivery: Arc<crate::services::DeliveryDetailsService>,
    pub order: Arc<crate::services::OrderService>,
    pub checkout: Arc<crate::services::CheckoutService>,
    pub bank_slips: Arc<crate::services::BankSlipService>,
}

impl AppServices {
    /// Wires the full service graph over one database pool.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let cart = Arc::new(crate::services::CartService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let wishlist = Arc::new(crate::services::wishlist::WishlistService::new(
            db_pool.clone(),
            event_sender.clone(),
            cart.clone(),
        ));
        let delivery = Arc::new(crate::services::DeliveryDetailsService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let order = Arc::new(crate::services::OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let gateway = Arc::new(crate::services::PaymentGateway::new(config.payment.clone()));
        let checkout = Arc::new(crate::services::CheckoutService::new(
            db_pool.clone(),
            cart.clone(),
            order.clone(),
            delivery.clone(),
            gateway,
        ));
        let bank_slips = Arc::new(crate::services::BankSlipService::new(
            db_pool,
            event_sender,
            config.upload_dir.clone(),
        ));

        Self {
            cart,
            wishlist,
            delivery,
            order,
            checkout,
            bank_slips,
        }
    }
}
