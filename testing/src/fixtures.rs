//! Canned domain values for tests.

#![allow(clippy::unwrap_used)] // Fixture carts are built from known-valid lines
#![allow(clippy::missing_panics_doc)]

use crust_core::cart::{Cart, NewCartItem};
use crust_core::types::{CurrentUser, GuestContact, Money, PizzaSize, UserId};

/// A signed-in test user with a fresh id.
#[must_use]
pub fn test_user() -> CurrentUser {
    CurrentUser {
        id: UserId::new(),
        name: "Ama Mensah".to_string(),
        phone: Some("0241234567".to_string()),
    }
}

/// A complete guest contact.
#[must_use]
pub fn guest_contact() -> GuestContact {
    GuestContact {
        name: "Kofi Boateng".to_string(),
        phone: "0201234567".to_string(),
        address: "12 Oxford Street, Osu, Accra".to_string(),
    }
}

/// A plain medium pizza line with the given unit price in pesewas.
#[must_use]
pub fn cart_item(product_id: &str, unit_price: u64, quantity: u32) -> NewCartItem {
    NewCartItem {
        product_id: product_id.to_string(),
        name: product_id.to_string(),
        unit_price: Money::from_pesewas(unit_price),
        size: PizzaSize::Medium,
        toppings: Vec::new(),
        quantity,
        image_url: None,
    }
}

/// A two-line cart: 2 x GHS 90.00 + 1 x GHS 50.00 = GHS 230.00 subtotal.
#[must_use]
pub fn sample_cart() -> Cart {
    let mut cart = Cart::new();
    cart.add(cart_item("margherita", 9000, 2)).unwrap();
    cart.add(cart_item("pepperoni", 5000, 1)).unwrap();
    cart
}
