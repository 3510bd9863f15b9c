//! Delivery-address endpoints, all owner-scoped.
//!
//! - `GET /api/addresses` - list the caller's saved addresses
//! - `POST /api/addresses` - save a new address
//! - `PUT /api/addresses/:id` - rewrite an address
//! - `DELETE /api/addresses/:id` - remove an address
//!
//! The store keeps at most one default per user; sending
//! `is_default: true` here demotes whichever address held it before.

use crate::error::AppError;
use crate::extractors::SessionUser;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use crust_core::store::{Address, AddressInput};
use crust_core::types::AddressId;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for `GET /api/addresses`.
#[derive(Debug, Serialize)]
pub struct AddressesResponse {
    /// Default first, then most recently created
    pub addresses: Vec<Address>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Lists the caller's saved addresses.
pub async fn list_addresses(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> Result<Json<AddressesResponse>, AppError> {
    let addresses = state.addresses.list(user.id).await?;
    Ok(Json(AddressesResponse { addresses }))
}

/// Saves a new address for the caller.
///
/// ```text
/// curl -X POST http://localhost:8080/api/addresses \
///   -H 'Authorization: Bearer <token>' \
///   -H 'Content-Type: application/json' \
///   -d '{"label":"Home","street":"12 Oxford Street","city":"Accra","state":"Greater Accra","zip":"GA-107","is_default":true}'
/// ```
///
/// # Status Codes
///
/// - 201: address saved
/// - 401: not signed in
/// - 422: a field failed validation
pub async fn create_address(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>), AppError> {
    input.validate().map_err(AppError::validation)?;
    let address = state.addresses.create(user.id, input).await?;
    tracing::info!(user_id = %user.id, address_id = %address.id, "address saved");
    Ok((StatusCode::CREATED, Json(address)))
}

/// Rewrites one of the caller's addresses.
///
/// # Status Codes
///
/// - 200: address updated
/// - 401: not signed in
/// - 404: no such address for this caller
/// - 422: a field failed validation
pub async fn update_address(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(address_id): Path<Uuid>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>, AppError> {
    input.validate().map_err(AppError::validation)?;
    let address = state
        .addresses
        .update(user.id, AddressId::from_uuid(address_id), input)
        .await?;
    Ok(Json(address))
}

/// Removes one of the caller's addresses.
///
/// # Status Codes
///
/// - 204: address removed
/// - 401: not signed in
/// - 404: no such address for this caller
pub async fn delete_address(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(address_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .addresses
        .delete(user.id, AddressId::from_uuid(address_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
