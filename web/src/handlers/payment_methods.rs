//! Saved-payment-method endpoints, all owner-scoped.
//!
//! - `GET /api/payment-methods` - list the caller's saved methods
//! - `POST /api/payment-methods` - save a new method
//! - `PUT /api/payment-methods/:id` - partial update (default flag, holder)
//! - `DELETE /api/payment-methods/:id` - remove a method
//!
//! Card numbers never reach storage: the request carries the full PAN,
//! the store keeps provider and last four digits only. Mobile money
//! numbers are normalized and their provider detected from the prefix.

use crate::error::AppError;
use crate::extractors::SessionUser;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use crust_core::store::{PaymentMethod, PaymentMethodInput, PaymentMethodUpdate};
use crust_core::types::PaymentMethodId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for `POST /api/payment-methods`, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavePaymentMethodRequest {
    /// A mobile money wallet.
    MobileMoney {
        /// Wallet number in local or international form
        phone: String,
        /// Make this the default method
        #[serde(default)]
        is_default: bool,
    },
    /// A payment card.
    Card {
        /// Full card number; only the last four digits are kept
        number: String,
        /// Name on the card
        #[serde(default)]
        holder_name: Option<String>,
        /// Card network, e.g. `"Visa"`
        #[serde(default)]
        provider: Option<String>,
        /// Make this the default method
        #[serde(default)]
        is_default: bool,
    },
}

impl SavePaymentMethodRequest {
    fn into_input(self) -> Result<PaymentMethodInput, AppError> {
        let input = match self {
            Self::MobileMoney { phone, is_default } => {
                PaymentMethodInput::mobile_money(&phone, is_default)
            }
            Self::Card {
                number,
                holder_name,
                provider,
                is_default,
            } => PaymentMethodInput::card(&number, holder_name, provider, is_default),
        };
        input.map_err(AppError::validation)
    }
}

/// Response for `GET /api/payment-methods`.
#[derive(Debug, Serialize)]
pub struct PaymentMethodsResponse {
    /// Default first, then most recently created
    pub payment_methods: Vec<PaymentMethod>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Lists the caller's saved payment methods.
pub async fn list_payment_methods(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> Result<Json<PaymentMethodsResponse>, AppError> {
    let payment_methods = state.payment_methods.list(user.id).await?;
    Ok(Json(PaymentMethodsResponse { payment_methods }))
}

/// Saves a new payment method for the caller.
///
/// ```text
/// curl -X POST http://localhost:8080/api/payment-methods \
///   -H 'Authorization: Bearer <token>' \
///   -H 'Content-Type: application/json' \
///   -d '{"kind":"mobile_money","phone":"0241234567","is_default":true}'
/// ```
///
/// # Status Codes
///
/// - 201: method saved
/// - 401: not signed in
/// - 422: the number failed validation
pub async fn create_payment_method(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(request): Json<SavePaymentMethodRequest>,
) -> Result<(StatusCode, Json<PaymentMethod>), AppError> {
    let input = request.into_input()?;
    let method = state.payment_methods.create(user.id, input).await?;
    tracing::info!(user_id = %user.id, method_id = %method.id, kind = %method.kind, "payment method saved");
    Ok((StatusCode::CREATED, Json(method)))
}

/// Applies a partial update to one of the caller's payment methods.
///
/// Only the default flag and the holder name can change; number and
/// provider are fixed at creation.
///
/// # Status Codes
///
/// - 200: method updated
/// - 401: not signed in
/// - 404: no such method for this caller
pub async fn update_payment_method(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(method_id): Path<Uuid>,
    Json(update): Json<PaymentMethodUpdate>,
) -> Result<Json<PaymentMethod>, AppError> {
    let method = state
        .payment_methods
        .update(user.id, PaymentMethodId::from_uuid(method_id), update)
        .await?;
    Ok(Json(method))
}

/// Removes one of the caller's payment methods.
///
/// # Status Codes
///
/// - 204: method removed
/// - 401: not signed in
/// - 404: no such method for this caller
pub async fn delete_payment_method(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(method_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .payment_methods
        .delete(user.id, PaymentMethodId::from_uuid(method_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
