//! Checkout endpoint.
//!
//! `POST /api/checkout` turns the session cart into an order. The
//! endpoint is rate limited per caller (user id when signed in, client IP
//! otherwise) because every successful mobile-money checkout triggers an
//! outbound payment call. All failures come back in one envelope shape so
//! storefront clients branch on `success` alone.

use super::cart::clear_cookie;
use crate::error::AppError;
use crate::extractors::{ClientIp, MaybeUser, SessionCart};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crust_core::checkout::{CheckoutError, CheckoutOutcome, CheckoutRequest, FieldErrors};
use crust_core::types::{CurrentUser, GuestContact, Money, OrderId};
use serde::Serialize;
use std::net::IpAddr;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Uniform checkout envelope.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Whether an order was created
    pub success: bool,
    /// The new order's id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    /// Grand total charged or to be collected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
    /// Echo of the guest contact, for the "create an account" follow-up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_contact: Option<GuestContact>,
    /// Top-level failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Field-keyed validation detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl CheckoutResponse {
    fn completed(outcome: CheckoutOutcome) -> Self {
        Self {
            success: true,
            order_id: Some(outcome.order_id),
            total: Some(outcome.total),
            guest_contact: outcome.guest_contact,
            error: None,
            errors: None,
        }
    }

    fn failed(error: impl Into<String>, errors: Option<FieldErrors>) -> Self {
        Self {
            success: false,
            order_id: None,
            total: None,
            guest_contact: None,
            error: Some(error.into()),
            errors,
        }
    }
}

/// Rate-limit key for this caller: stable across requests for signed-in
/// users, per-address for guests.
fn limit_key(user: Option<&CurrentUser>, ip: IpAddr) -> String {
    user.map_or_else(|| format!("ip:{ip}"), |u| format!("user:{}", u.id))
}

// ============================================================================
// Handlers
// ============================================================================

/// Runs a checkout.
///
/// On success the cart cookie is expired alongside the order echo; the
/// cart itself was only ever in the cookie.
///
/// ```text
/// curl -X POST http://localhost:8080/api/checkout \
///   --cookie "crust_cart=..." \
///   -H 'Content-Type: application/json' \
///   -d '{"payment":{"method":"cash_on_delivery"},
///        "contact":{"name":"Kofi Boateng","phone":"0201234567",
///                   "address":"12 Oxford Street, Osu, Accra"}}'
/// ```
///
/// # Status Codes
///
/// - 200: order created
/// - 422: validation failure or empty cart
/// - 429: too many attempts in the window
/// - 500: order persistence failed
pub async fn checkout(
    State(state): State<AppState>,
    SessionCart(cart): SessionCart,
    MaybeUser(user): MaybeUser,
    ClientIp(ip): ClientIp,
    Json(request): Json<CheckoutRequest>,
) -> Response {
    let key = limit_key(user.as_ref(), ip);
    let limit = state.checkout_limit;
    if !state.limiter.check(&key, limit.max_requests, limit.window).await {
        tracing::warn!(key = %key, "checkout rate limit hit");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(CheckoutResponse::failed(
                "too many checkout attempts, try again shortly",
                None,
            )),
        )
            .into_response();
    }

    match state.checkout.process(&cart, request, user.as_ref()).await {
        Ok(outcome) => (clear_cookie(), Json(CheckoutResponse::completed(outcome))).into_response(),
        Err(error) => {
            if matches!(error, CheckoutError::Storage(_)) {
                tracing::error!(%error, "checkout failed");
            }
            let app: AppError = error.into();
            let body = CheckoutResponse::failed(app.message(), app.field_errors().cloned());
            (app.status(), Json(body)).into_response()
        }
    }
}
