//! # Crust Core
//!
//! Domain types and business logic for the Crust pizza storefront.
//!
//! This crate carries no HTTP or database concerns. It owns:
//!
//! - **Cart**: bounded in-memory cart with line merging ([`cart`])
//! - **Cookie codec**: signed, tamper-evident cart persistence ([`cookie`])
//! - **Orders**: the order aggregate and its status machines ([`order`])
//! - **Checkout**: the cart → order → payment orchestrator ([`checkout`])
//! - **Stores**: persistence traits implemented by `crust-postgres` and
//!   the in-memory doubles in `crust-testing` ([`store`])
//! - **Collaborators**: payment gateway, identity, and rate limiter
//!   traits ([`gateway`], [`identity`], [`limiter`])
//!
//! ## Architecture
//!
//! ```text
//! crust-web ──▶ CheckoutService ──▶ OrderStore / AddressStore / PaymentMethodStore
//!                     │
//!                     └──────────▶ PaymentGateway (push payments)
//! ```
//!
//! All collaborator traits are dyn-compatible so the web layer can hold
//! them as `Arc<dyn Trait>` and tests can swap in doubles.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod cart;
pub mod checkout;
pub mod cookie;
pub mod gateway;
pub mod identity;
pub mod limiter;
pub mod order;
pub mod phone;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use cart::{Cart, CartError, CartItem, CartSummary, NewCartItem};
pub use checkout::{
    CheckoutError, CheckoutOutcome, CheckoutRequest, CheckoutService, FieldError, FieldErrors,
    PaymentSelection, PricingConfig, Totals,
};
pub use cookie::CartCookieCodec;
pub use gateway::{GatewayError, GatewayResult, MockPaymentGateway, PaymentGateway, PaymentRequest};
pub use identity::Identity;
pub use limiter::RateLimiter;
pub use order::{NewOrder, Order, OrderItem, OrderStatus, PaymentKind, PaymentStatus};
pub use store::{
    Address, AddressInput, AddressStore, OrderStore, PaymentMethod, PaymentMethodInput,
    PaymentMethodKind, PaymentMethodStore, PaymentMethodUpdate, StoreError,
};
pub use types::{
    AddressId, CartItemId, CurrentUser, GuestContact, Money, OrderId, PaymentMethodId, PizzaSize,
    UserId,
};
