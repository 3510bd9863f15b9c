//! Order endpoints.
//!
//! - `GET /api/orders` - the signed-in user's orders, newest first
//! - `GET /api/orders/:id` - one order, subject to visibility
//! - `POST /api/orders/:id/cancel` - customer cancellation
//! - `POST /api/orders/:id/link` - attach a guest order to the caller
//!
//! Visibility: owned orders belong to their owner alone; orders without
//! an owner are readable by anyone holding the id, which is how guests
//! check on an order from the confirmation link. A hidden order answers
//! exactly like a missing one.

use crate::error::AppError;
use crate::extractors::{MaybeUser, SessionUser};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use crust_core::order::Order;
use crust_core::types::OrderId;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for `GET /api/orders`.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    /// The user's orders, newest first
    pub orders: Vec<Order>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Lists the signed-in user's orders.
///
/// ```text
/// curl http://localhost:8080/api/orders -H 'Authorization: Bearer <token>'
/// ```
pub async fn list_orders(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> Result<Json<OrdersResponse>, AppError> {
    let orders = state.orders.list_for_user(user.id).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Fetches one order.
///
/// Anonymous callers can read unowned (guest) orders; owned orders
/// require the owner's token. Anything else is a 404.
pub async fn get_order(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order_id = OrderId::from_uuid(id);
    let order = state
        .orders
        .get(order_id)
        .await?
        .filter(|order| order.visible_to(user.as_ref().map(|u| u.id)))
        .ok_or_else(|| AppError::not_found("Order", order_id))?;
    Ok(Json(order))
}

/// Cancels an order the caller owns.
///
/// Only `PENDING` and `CONFIRMED` orders qualify; once the kitchen has
/// started, cancellation is a 409.
///
/// ```text
/// curl -X POST http://localhost:8080/api/orders/<id>/cancel \
///   -H 'Authorization: Bearer <token>'
/// ```
pub async fn cancel_order(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.orders.cancel(OrderId::from_uuid(id), user.id).await?;
    tracing::info!(order_id = %order.id, user_id = %user.id, "order cancelled");
    Ok(Json(order))
}

/// Attaches a guest order to the signed-in user's account.
///
/// Meant for the post-signup flow: place an order as a guest, create an
/// account, claim the order. Orders that already have an owner are never
/// re-linked (409).
pub async fn link_order(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .link_to_user(OrderId::from_uuid(id), user.id)
        .await?;
    tracing::info!(order_id = %order.id, user_id = %user.id, "guest order linked");
    Ok(Json(order))
}
