//! Cart endpoints.
//!
//! The cart lives in a signed cookie, so every endpoint here is
//! stateless: decode, mutate in memory, re-encode, and hand the new
//! cookie back with the response.
//!
//! - `GET /api/cart` - current cart
//! - `POST /api/cart/items` - add an item
//! - `PATCH /api/cart/items/:id` - change a line's quantity
//! - `DELETE /api/cart/items/:id` - remove a line
//! - `DELETE /api/cart` - empty the cart

use crate::error::AppError;
use crate::extractors::SessionCart;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header::{self, HeaderName},
    response::AppendHeaders,
    Json,
};
use crust_core::cart::{Cart, CartItem, NewCartItem};
use crust_core::cookie::CART_COOKIE_NAME;
use crust_core::types::{CartItemId, Money};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// The cart as returned to clients.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    /// The lines in insertion order
    pub items: Vec<CartItem>,
    /// Sum of quantities across all lines
    pub total_items: u32,
    /// Sum of line totals in pesewas
    pub total: Money,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        let summary = cart.summary();
        Self {
            items: cart.items().to_vec(),
            total_items: summary.total_items,
            total: summary.total,
        }
    }
}

/// Body for `PATCH /api/cart/items/:id`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// New quantity; zero or less removes the line
    pub quantity: i64,
}

type SetCartCookie = AppendHeaders<[(HeaderName, String); 1]>;

fn cookie_with(value: &str, max_age_secs: i64) -> SetCartCookie {
    AppendHeaders([(
        header::SET_COOKIE,
        format!(
            "{CART_COOKIE_NAME}={value}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax"
        ),
    )])
}

/// A `Set-Cookie` header carrying the freshly signed cart.
pub(crate) fn issue_cookie(state: &AppState, cart: &Cart) -> SetCartCookie {
    cookie_with(
        &state.cart_codec.encode(cart),
        state.cart_codec.max_age().num_seconds(),
    )
}

/// A `Set-Cookie` header that expires the cart cookie immediately.
pub(crate) fn clear_cookie() -> SetCartCookie {
    cookie_with("", 0)
}

// ============================================================================
// Handlers
// ============================================================================

/// Returns the current cart.
///
/// Re-issues the cookie so active carts slide their expiry forward.
///
/// ```text
/// curl http://localhost:8080/api/cart --cookie "crust_cart=..."
/// ```
#[allow(clippy::unused_async)]
pub async fn get_cart(
    State(state): State<AppState>,
    SessionCart(cart): SessionCart,
) -> (SetCartCookie, Json<CartResponse>) {
    (issue_cookie(&state, &cart), Json(CartResponse::from(&cart)))
}

/// Adds an item to the cart.
///
/// Items matching an existing line's product, size, and toppings merge
/// into that line instead of duplicating it.
///
/// ```text
/// curl -X POST http://localhost:8080/api/cart/items \
///   -H 'Content-Type: application/json' \
///   -d '{"product_id":"margherita","name":"Margherita","unit_price":4500,
///        "size":"medium","toppings":["extra cheese"],"quantity":2}'
/// ```
///
/// # Errors
///
/// 422 with field detail when the item is malformed or the cart is full.
#[allow(clippy::unused_async)]
pub async fn add_item(
    State(state): State<AppState>,
    SessionCart(mut cart): SessionCart,
    Json(item): Json<NewCartItem>,
) -> Result<(SetCartCookie, Json<CartResponse>), AppError> {
    cart.add(item)?;
    Ok((issue_cookie(&state, &cart), Json(CartResponse::from(&cart))))
}

/// Changes a line's quantity.
///
/// Quantities are clamped to the allowed range; zero or less removes the
/// line. Unknown line ids are ignored.
#[allow(clippy::unused_async)]
pub async fn update_item(
    State(state): State<AppState>,
    SessionCart(mut cart): SessionCart,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateItemRequest>,
) -> (SetCartCookie, Json<CartResponse>) {
    cart.set_quantity(CartItemId::from_uuid(id), body.quantity);
    (issue_cookie(&state, &cart), Json(CartResponse::from(&cart)))
}

/// Removes a line. Unknown line ids are ignored.
#[allow(clippy::unused_async)]
pub async fn remove_item(
    State(state): State<AppState>,
    SessionCart(mut cart): SessionCart,
    Path(id): Path<Uuid>,
) -> (SetCartCookie, Json<CartResponse>) {
    cart.remove(CartItemId::from_uuid(id));
    (issue_cookie(&state, &cart), Json(CartResponse::from(&cart)))
}

/// Empties the cart by expiring the cookie.
#[allow(clippy::unused_async)]
pub async fn clear_cart() -> (SetCartCookie, Json<CartResponse>) {
    (clear_cookie(), Json(CartResponse::from(&Cart::new())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crust_testing::fixtures;

    #[test]
    fn response_carries_lines_and_summary() {
        let cart = fixtures::sample_cart();
        let response = CartResponse::from(&cart);
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.total_items, 3);
        assert_eq!(response.total, Money::from_pesewas(23_000));
    }

    #[test]
    fn issued_cookie_is_scoped_and_http_only() {
        let AppendHeaders([(name, value)]) = cookie_with("abc", 604_800);
        assert_eq!(name, header::SET_COOKIE);
        assert!(value.starts_with("crust_cart=abc;"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=604800"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let AppendHeaders([(_, value)]) = clear_cookie();
        assert!(value.starts_with("crust_cart=;"));
        assert!(value.contains("Max-Age=0"));
    }
}
