//! Application state for Axum handlers.
//!
//! One `AppState` is built at startup from [`crate::config::Config`] and
//! cloned into every handler. All collaborators are held as `Arc<dyn …>`
//! trait objects, so integration tests swap in the `crust-testing` doubles
//! without touching the router.

use crust_core::checkout::CheckoutService;
use crust_core::cookie::CartCookieCodec;
use crust_core::gateway::PaymentGateway;
use crust_core::identity::Identity;
use crust_core::limiter::RateLimiter;
use crust_core::store::{AddressStore, OrderStore, PaymentMethodStore};
use std::sync::Arc;
use std::time::Duration;

/// Rate-limit parameters applied to the checkout endpoint.
#[derive(Clone, Copy, Debug)]
pub struct CheckoutLimit {
    /// Allowed checkout attempts per window, per caller
    pub max_requests: u32,
    /// Length of the sliding window
    pub window: Duration,
}

/// Application state shared across all HTTP handlers.
///
/// # Examples
///
/// ```ignore
/// use axum::{extract::State, Json};
/// use crust_web::{AppError, AppState};
///
/// async fn handler(State(state): State<AppState>) -> Result<Json<Response>, AppError> {
///     let orders = state.orders.list_for_user(user_id).await?;
///     Ok(Json(response))
/// }
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Order persistence
    pub orders: Arc<dyn OrderStore>,
    /// Saved-address registry
    pub addresses: Arc<dyn AddressStore>,
    /// Saved-payment-method registry
    pub payment_methods: Arc<dyn PaymentMethodStore>,
    /// Bearer-token resolver
    pub identity: Arc<dyn Identity>,
    /// Mobile-money gateway, used directly for status enquiries
    pub gateway: Arc<dyn PaymentGateway>,
    /// Rate limiter guarding checkout
    pub limiter: Arc<dyn RateLimiter>,
    /// Checkout orchestrator
    pub checkout: Arc<CheckoutService>,
    /// Signed cart cookie codec
    pub cart_codec: CartCookieCodec,
    /// Shared secret the payment provider must echo on callbacks
    pub callback_token: String,
    /// Checkout rate-limit parameters
    pub checkout_limit: CheckoutLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_clone() {
        // Axum requires Clone state
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
