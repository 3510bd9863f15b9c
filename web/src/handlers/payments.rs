//! Payment endpoints.
//!
//! - `POST /api/payments/callback` - provider webhook settling a charge
//! - `GET /api/payments/:reference/status` - combined local + provider view
//!
//! The callback is authenticated by a shared token compared in constant
//! time; the provider retries delivery, and the store treats re-delivery
//! of the same outcome as a no-op, so the endpoint is safe to hit twice.

use crate::error::AppError;
use crate::extractors::MaybeUser;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use constant_time_eq::constant_time_eq;
use crust_core::order::{OrderStatus, PaymentKind, PaymentStatus};
use crust_core::types::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header the provider echoes the shared callback secret in.
pub const CALLBACK_TOKEN_HEADER: &str = "X-Callback-Token";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Webhook body posted by the payment provider.
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    /// Merchant reference of the charge; we use the order id
    pub reference: String,
    /// Provider outcome, `"success"` or a failure label
    pub status: String,
    /// Provider-side transaction id
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Acknowledgement returned to the provider.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    /// The settled order
    pub order_id: OrderId,
    /// Payment state after applying the callback
    pub payment_status: PaymentStatus,
    /// Fulfilment state after applying the callback
    pub order_status: OrderStatus,
}

/// Response for `GET /api/payments/:reference/status`.
#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    /// The order behind the reference
    pub order_id: OrderId,
    /// Our settlement state
    pub payment_status: PaymentStatus,
    /// Provider-side transaction state (mobile money only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_status: Option<String>,
    /// Provider-side transaction id (mobile money only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Maps the provider's outcome label onto our settlement state.
fn settlement_from(provider_status: &str) -> PaymentStatus {
    if provider_status.eq_ignore_ascii_case("success") {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Failed
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Applies a payment outcome delivered by the provider.
///
/// A successful payment also advances a still-`PENDING` order to
/// `CONFIRMED`; a failed one leaves the order alone so the customer can
/// retry or switch to cash.
///
/// ```text
/// curl -X POST http://localhost:8080/api/payments/callback \
///   -H 'X-Callback-Token: <shared secret>' \
///   -H 'Content-Type: application/json' \
///   -d '{"reference":"<order id>","status":"success","transaction_id":"txn_123"}'
/// ```
///
/// # Status Codes
///
/// - 200: outcome applied (or already applied)
/// - 401: missing or wrong callback token
/// - 404: unknown reference
/// - 409: charge already settled differently
pub async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, AppError> {
    let provided = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !constant_time_eq(provided.as_bytes(), state.callback_token.as_bytes()) {
        tracing::warn!(reference = %body.reference, "callback with bad token rejected");
        return Err(AppError::unauthorized("invalid callback token"));
    }

    let order_id = body
        .reference
        .parse::<Uuid>()
        .map(OrderId::from_uuid)
        .map_err(|_| AppError::bad_request("reference is not a valid order id"))?;

    let settlement = settlement_from(&body.status);
    let order = state
        .orders
        .update_payment_status(order_id, settlement)
        .await?;

    tracing::info!(
        order_id = %order.id,
        payment_status = %order.payment_status,
        order_status = %order.status,
        transaction_id = body.transaction_id.as_deref().unwrap_or("-"),
        "payment callback applied"
    );

    Ok(Json(CallbackResponse {
        order_id: order.id,
        payment_status: order.payment_status,
        order_status: order.status,
    }))
}

/// Reports the payment state of an order, asking the provider for the
/// live transaction state when the order was paid by mobile money.
///
/// Subject to the same visibility rule as `GET /api/orders/:id`.
pub async fn payment_status(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(reference): Path<String>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    let order_id = reference
        .parse::<Uuid>()
        .map(OrderId::from_uuid)
        .map_err(|_| AppError::not_found("Order", &reference))?;

    let order = state
        .orders
        .get(order_id)
        .await?
        .filter(|order| order.visible_to(user.as_ref().map(|u| u.id)))
        .ok_or_else(|| AppError::not_found("Order", order_id))?;

    let (transaction_status, transaction_id) = match order.payment_kind {
        PaymentKind::MobileMoney => {
            let receipt = state.gateway.check_status(&order.id.to_string()).await?;
            (Some(receipt.transaction_status), receipt.transaction_id)
        }
        PaymentKind::Card | PaymentKind::CashOnDelivery => (None, None),
    };

    Ok(Json(PaymentStatusResponse {
        order_id: order.id,
        payment_status: order.payment_status,
        transaction_status,
        transaction_id,
    }))
}
