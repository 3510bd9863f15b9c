//! Session cart model.
//!
//! A cart is an ordered list of pizza lines living entirely inside a signed
//! browser cookie (see [`crate::cookie`]); nothing here touches storage.
//! Lines for the same product, size, and topping combination merge instead
//! of duplicating, quantities are clamped to a small range, and the line
//! count is capped so the encoded cart stays well under the cookie size
//! limit.

use crate::types::{CartItemId, Money, PizzaSize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of distinct lines a cart may hold.
pub const MAX_CART_ITEMS: usize = 20;

/// Smallest allowed quantity for a line.
pub const MIN_ITEM_QTY: u32 = 1;

/// Largest allowed quantity for a line.
pub const MAX_ITEM_QTY: u32 = 10;

/// Errors raised by cart mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The cart already holds [`MAX_CART_ITEMS`] distinct lines.
    #[error("cart is full: at most {MAX_CART_ITEMS} distinct items")]
    CartFull,

    /// The submitted item failed shape validation.
    #[error("invalid cart item: {0}")]
    InvalidItem(String),
}

/// A line in the cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Stable id for this line, used by update and remove calls
    pub id: CartItemId,
    /// Catalog id of the pizza
    pub product_id: String,
    /// Display name at the time the line was added
    pub name: String,
    /// Price per unit at the time the line was added
    pub unit_price: Money,
    /// Chosen size
    pub size: PizzaSize,
    /// Extra toppings; order does not matter for identity
    #[serde(default)]
    pub toppings: Vec<String>,
    /// Units of this line, always within `MIN_ITEM_QTY..=MAX_ITEM_QTY`
    pub quantity: u32,
    /// Product image, carried through to the order snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartItem {
    /// Price of the whole line. Saturates on overflow; validated carts stay
    /// far below the limit.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price
            .checked_multiply(self.quantity)
            .unwrap_or(Money::from_pesewas(u64::MAX))
    }

    fn same_configuration(&self, product_id: &str, size: PizzaSize, toppings: &[String]) -> bool {
        self.product_id == product_id
            && self.size == size
            && sorted(&self.toppings) == sorted(toppings)
    }
}

fn sorted(toppings: &[String]) -> Vec<&str> {
    let mut v: Vec<&str> = toppings.iter().map(String::as_str).collect();
    v.sort_unstable();
    v
}

/// An item as submitted by the client, before it has a line id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    /// Catalog id of the pizza
    pub product_id: String,
    /// Display name
    pub name: String,
    /// Price per unit in pesewas
    pub unit_price: Money,
    /// Chosen size
    pub size: PizzaSize,
    /// Extra toppings
    #[serde(default)]
    pub toppings: Vec<String>,
    /// Requested quantity
    pub quantity: u32,
    /// Product image
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewCartItem {
    fn validate(&self) -> Result<(), CartError> {
        if self.product_id.trim().is_empty() {
            return Err(CartError::InvalidItem("product_id is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(CartError::InvalidItem("name is required".into()));
        }
        if self.unit_price.is_zero() {
            return Err(CartError::InvalidItem("unit_price must be positive".into()));
        }
        if self.quantity < MIN_ITEM_QTY || self.quantity > MAX_ITEM_QTY {
            return Err(CartError::InvalidItem(format!(
                "quantity must be between {MIN_ITEM_QTY} and {MAX_ITEM_QTY}"
            )));
        }
        Ok(())
    }
}

/// Roll-up of a cart: unit count and grand total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Sum of quantities across all lines
    pub total_items: u32,
    /// Sum of line totals
    pub total: Money,
}

/// The session cart: an ordered list of lines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The lines in insertion order
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Adds an item to the cart.
    ///
    /// An item matching an existing line's product, size, and topping set
    /// (order-insensitive) merges into that line, clamping the combined
    /// quantity to [`MAX_ITEM_QTY`]. Anything else becomes a new line with
    /// a fresh id. Returns the id of the line the item landed on.
    ///
    /// # Errors
    ///
    /// [`CartError::InvalidItem`] when the item fails shape validation,
    /// [`CartError::CartFull`] when a new line would exceed
    /// [`MAX_CART_ITEMS`]; the cart is untouched in both cases.
    pub fn add(&mut self, item: NewCartItem) -> Result<CartItemId, CartError> {
        item.validate()?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.same_configuration(&item.product_id, item.size, &item.toppings))
        {
            existing.quantity = (existing.quantity + item.quantity).min(MAX_ITEM_QTY);
            return Ok(existing.id);
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CartError::CartFull);
        }

        let id = CartItemId::new();
        self.items.push(CartItem {
            id,
            product_id: item.product_id,
            name: item.name,
            unit_price: item.unit_price,
            size: item.size,
            toppings: item.toppings,
            quantity: item.quantity,
            image_url: item.image_url,
        });
        Ok(id)
    }

    /// Sets the quantity of a line.
    ///
    /// Zero or negative removes the line; anything else is clamped into
    /// `MIN_ITEM_QTY..=MAX_ITEM_QTY`. Unknown ids are ignored.
    pub fn set_quantity(&mut self, id: CartItemId, quantity: i64) {
        if quantity <= 0 {
            self.remove(id);
            return;
        }
        if let Some(line) = self.items.iter_mut().find(|line| line.id == id) {
            line.quantity = u32::try_from(quantity)
                .unwrap_or(MAX_ITEM_QTY)
                .clamp(MIN_ITEM_QTY, MAX_ITEM_QTY);
        }
    }

    /// Removes a line. Unknown ids are ignored.
    pub fn remove(&mut self, id: CartItemId) {
        self.items.retain(|line| line.id != id);
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Unit count and grand total.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let total_items = self.items.iter().map(|line| line.quantity).sum();
        let total = self
            .items
            .iter()
            .fold(Money::ZERO, |acc, line| {
                acc.checked_add(line.line_total())
                    .unwrap_or(Money::from_pesewas(u64::MAX))
            });
        CartSummary { total_items, total }
    }

    /// Whether every line satisfies the invariants `add` enforces.
    ///
    /// Decoded carts are only trusted when this holds; the cookie codec
    /// discards anything that fails.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.items.len() <= MAX_CART_ITEMS
            && self.items.iter().all(|line| {
                !line.product_id.trim().is_empty()
                    && !line.name.trim().is_empty()
                    && !line.unit_price.is_zero()
                    && (MIN_ITEM_QTY..=MAX_ITEM_QTY).contains(&line.quantity)
            })
    }
}
