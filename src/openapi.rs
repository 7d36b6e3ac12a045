use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document for the storefront API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orchard API",
        description = "Carts, wishlists, checkout, delivery tracking, and payment reconciliation for the Orchard storefront"
    ),
    paths(
        crate::handlers::carts::add_to_cart,
        crate::handlers::carts::list_cart_items,
        crate::handlers::carts::update_cart_item,
        crate::handlers::carts::remove_cart_item,
        crate::handlers::wishlists::add_to_wishlist,
        crate::handlers::wishlists::list_wishlist,
        crate::handlers::wishlists::remove_from_wishlist,
        crate::handlers::wishlists::move_to_cart,
        crate::handlers::deliveries::save_delivery_details,
        crate::handlers::deliveries::list_delivery_details,
        crate::handlers::deliveries::get_delivery_detail,
        crate::handlers::deliveries::delete_delivery_detail,
        crate::handlers::deliveries::list_all_deliveries,
        crate::handlers::deliveries::list_cancelled_deliveries,
        crate::handlers::deliveries::update_delivery_status,
        crate::handlers::checkout::create_checkout_session,
        crate::handlers::checkout::confirm_payment,
        crate::handlers::payment_webhooks::payment_webhook,
        crate::handlers::bank_slips::upload_bank_slip,
        crate::handlers::bank_slips::list_bank_slips,
        crate::handlers::bank_slips::get_bank_slip,
        crate::handlers::bank_slips::update_bank_slip_status,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::list_completed_orders,
    ),
    components(schemas(crate::errors::ErrorResponse)),
    tags(
        (name = "Cart", description = "Per-user cart line items"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Deliveries", description = "Delivery details and tracking"),
        (name = "Checkout", description = "Checkout orchestration and confirmation"),
        (name = "Payments", description = "Processor notifications"),
        (name = "Bank slips", description = "Manual payment evidence"),
        (name = "Orders", description = "Order history")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
