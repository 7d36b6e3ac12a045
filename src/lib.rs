//! Orchard API Library
//!
//! Backend for an online fruit-and-sweets storefront: per-user carts and
//! wishlists, delivery-detail capture, checkout against a hosted payment
//! processor, order lifecycle reconciliation, and bank-slip review.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use crate::auth::{AuthRouterExt, AuthService, ROLE_ADMIN};
use axum::{response::Json, routing::get, routing::post, Extension, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub redis: Arc<redis::Client>,
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Routes that live outside the versioned API surface.
pub fn base_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// The versioned API surface. Everything is auth-gated except the payment
/// webhook, which authenticates its payload by signature instead; admin
/// listings and review transitions additionally require the admin role.
pub fn api_v1_routes(auth_service: Arc<AuthService>) -> Router<Arc<AppState>> {
    let cart = handlers::carts::cart_routes().with_auth();
    let wishlist = handlers::wishlists::wishlist_routes().with_auth();
    let deliveries = handlers::deliveries::delivery_routes()
        .with_auth()
        .merge(handlers::deliveries::delivery_admin_routes().with_role(ROLE_ADMIN));
    let checkout = handlers::checkout::checkout_routes().with_auth();
    let orders = handlers::orders::order_routes().with_auth();
    let bank_slips = handlers::bank_slips::bank_slip_routes()
        .with_auth()
        .merge(handlers::bank_slips::bank_slip_admin_routes().with_role(ROLE_ADMIN));

    Router::new()
        .nest("/cart", cart)
        .nest("/wishlist", wishlist)
        .nest("/deliveries", deliveries)
        .nest("/checkout", checkout)
        .nest("/orders", orders)
        .nest("/bank-slips", bank_slips)
        // Raw-body route; signature verification happens in the handler
        .route(
            "/payments/webhook",
            post(handlers::payment_webhooks::payment_webhook),
        )
        .layer(Extension(auth_service))
}
