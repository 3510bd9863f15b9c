//! Router configuration for the storefront API.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::addresses::{
    create_address, delete_address, list_addresses, update_address,
};
use crate::handlers::cart::{add_item, clear_cart, get_cart, remove_item, update_item};
use crate::handlers::checkout::checkout;
use crate::handlers::health::{health, ready};
use crate::handlers::orders::{cancel_order, get_order, link_order, list_orders};
use crate::handlers::payment_methods::{
    create_payment_method, delete_payment_method, list_payment_methods, update_payment_method,
};
use crate::handlers::payments::{payment_callback, payment_status};
use crate::middleware::request_id;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer,
};

/// Build the complete Axum router.
///
/// Configures all routes including:
/// - Health checks
/// - Cart endpoints (cookie-backed, no authentication)
/// - Checkout
/// - Order queries and lifecycle actions
/// - Payment provider callback and status enquiry
/// - Address and payment-method registries (authenticated)
///
/// Every request passes through request-id tagging, HTTP tracing, CORS,
/// and response compression.
pub fn build_router(state: AppState) -> Router {
    // API routes
    let api_routes = Router::new()
        // Cart
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:item_id", patch(update_item).delete(remove_item))
        // Checkout
        .route("/checkout", post(checkout))
        // Orders
        .route("/orders", get(list_orders))
        .route("/orders/:order_id", get(get_order))
        .route("/orders/:order_id/cancel", post(cancel_order))
        .route("/orders/:order_id/link", post(link_order))
        // Payments
        .route("/payments/callback", post(payment_callback))
        .route("/payments/:reference/status", get(payment_status))
        // Address book
        .route("/addresses", get(list_addresses).post(create_address))
        .route("/addresses/:address_id", put(update_address).delete(delete_address))
        // Payment methods
        .route(
            "/payment-methods",
            get(list_payment_methods).post(create_payment_method),
        )
        .route(
            "/payment-methods/:method_id",
            put(update_payment_method).delete(delete_payment_method),
        );

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health))
        .route("/ready", get(ready))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .with_state(state)
        .layer(CompressionLayer::new())
        // Mirrors the request origin so browsers send the cart cookie cross-site
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id))
}
