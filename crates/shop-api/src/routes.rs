//! # Routes
//!
//! Axum router configuration for the shop API.

use crate::admin;
use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Cart:
///   - POST   /api/v1/cart/items - Add product (lazily creates cart)
///   - PATCH  /api/v1/cart/items/{id} - Reassign line quantity
///   - DELETE /api/v1/cart/items/{id} - Remove line
///   - GET    /api/v1/cart - Cart contents and total
///
/// - Checkout:
///   - POST /api/v1/checkout/preference - Create payment preference
///   - POST /api/v1/checkout/simulate - Simulated checkout
///   - POST /webhook/mercadopago - Payment notification webhook
///
/// - Orders:
///   - GET /api/v1/orders - Authenticated user's history
///   - GET /api/v1/orders/{id}
///   - GET /api/v1/orders/by-payment/{payment_id}
///
/// - Catalog (reads public, writes permission-gated):
///   - GET    /api/v1/products, /api/v1/products/{id}, /api/v1/products/categories
///   - POST   /api/v1/products, PATCH/DELETE /api/v1/products/{id}
///   - POST   /api/v1/stores
///
/// - Stock (permission-gated):
///   - POST /api/v1/stock
///   - POST /api/v1/stock/{id}/adjust
///   - POST /api/v1/stock/transfer
///
/// - Contact:
///   - POST /api/v1/contact (public), GET /api/v1/contact (inbox)
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - the storefront frontend is a separate origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cart_routes = Router::new()
        .route("/items", post(handlers::add_cart_item))
        .route(
            "/items/{item_id}",
            patch(handlers::update_cart_item).delete(handlers::remove_cart_item),
        );

    let checkout_routes = Router::new()
        .route("/preference", post(handlers::create_preference))
        .route("/simulate", post(handlers::simulate_checkout));

    let order_routes = Router::new()
        .route("/", get(handlers::list_orders))
        .route("/{order_id}", get(handlers::get_order))
        .route(
            "/by-payment/{payment_id}",
            get(handlers::get_order_by_payment),
        );

    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::list_products).post(admin::create_product),
        )
        .route("/categories", get(handlers::list_categories))
        .route(
            "/{product_id}",
            get(handlers::get_product)
                .patch(admin::update_product)
                .delete(admin::delete_product),
        );

    let stock_routes = Router::new()
        .route("/", post(admin::create_stock_entry))
        .route("/{entry_id}/adjust", post(admin::adjust_stock))
        .route("/transfer", post(admin::transfer_stock));

    let api_routes = Router::new()
        .route("/cart", get(handlers::get_cart))
        .nest("/cart", cart_routes)
        .nest("/checkout", checkout_routes)
        .nest("/orders", order_routes)
        .nest("/products", product_routes)
        .nest("/stock", stock_routes)
        .route("/stores", post(admin::create_store))
        .route(
            "/contact",
            post(handlers::submit_contact).get(admin::list_contact_messages),
        );

    // Webhook routes (no CORS, must accept raw body)
    let webhook_routes = Router::new().route("/mercadopago", post(handlers::mercadopago_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
