pub mod bank_slips;
pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod orders;
pub mod payments;
pub mod wishlist;

pub use bank_slips::BankSlipService;
pub use cart::CartService;
pub use checkout::CheckoutService;
pub use delivery::DeliveryDetailsService;
pub use orders::OrderService;
pub use payments::PaymentGateway;
