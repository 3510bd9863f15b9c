//! Order entity and its state machines.
//!
//! An order is an immutable snapshot of a cart plus delivery and payment
//! details, with two independent pieces of state layered on top: the
//! fulfilment status and the payment status. The legal fulfilment
//! transitions are:
//!
//! ```text
//! PENDING ──► CONFIRMED ──► PREPARING ──► OUT_FOR_DELIVERY ──► DELIVERED
//!    │            │             │
//!    └────────────┴─────────────┴──► CANCELLED
//! ```
//!
//! `DELIVERED` and `CANCELLED` are terminal. Every transition is checked by
//! [`OrderStatus::can_transition`]; stores refuse to persist anything the
//! machine forbids. Customer-initiated cancellation is narrower than the
//! machine: only `PENDING` and `CONFIRMED` orders qualify
//! ([`OrderStatus::is_cancellable`]); the `PREPARING -> CANCELLED` edge is
//! reserved for staff tooling.

use crate::cart::CartItem;
use crate::types::{AddressId, GuestContact, Money, OrderId, PizzaSize, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fulfilment state of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, payment not yet settled
    Pending,
    /// Payment settled or acknowledged; kitchen may pick it up
    Confirmed,
    /// Kitchen is working on it
    Preparing,
    /// Rider has it
    OutForDelivery,
    /// Handed to the customer (terminal)
    Delivered,
    /// Called off before preparation started (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Canonical wire/storage label (`"OUT_FOR_DELIVERY"` style).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a canonical label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "PREPARING" => Some(Self::Preparing),
            "OUT_FOR_DELIVERY" => Some(Self::OutForDelivery),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether the machine allows moving from `self` to `to`.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Preparing | Self::Cancelled)
                | (Self::Preparing, Self::OutForDelivery | Self::Cancelled)
                | (Self::OutForDelivery, Self::Delivered)
        )
    }

    /// Whether a customer may still cancel from this state.
    ///
    /// Narrower than `can_transition(Cancelled)`: once the kitchen has
    /// started, customers cannot back out on their own.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether no further transitions exist.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement state of the payment attached to an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting settlement
    Pending,
    /// Money received
    Paid,
    /// Settlement failed or was declined
    Failed,
}

impl PaymentStatus {
    /// Canonical wire/storage label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a canonical label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "PAID" => Some(Self::Paid),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer chose to pay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Card payment
    Card,
    /// Mobile-money push payment
    MobileMoney,
    /// Pay the rider on arrival
    CashOnDelivery,
}

impl PaymentKind {
    /// Canonical wire/storage label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::MobileMoney => "mobile_money",
            Self::CashOnDelivery => "cash_on_delivery",
        }
    }

    /// Parses a canonical label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "card" => Some(Self::Card),
            "mobile_money" => Some(Self::MobileMoney),
            "cash_on_delivery" => Some(Self::CashOnDelivery),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frozen order line.
///
/// Copied out of the cart at checkout; later catalog or cart edits never
/// reach it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog id at purchase time
    pub product_id: String,
    /// Display name at purchase time
    pub name: String,
    /// Unit price at purchase time
    pub unit_price: Money,
    /// Chosen size
    pub size: PizzaSize,
    /// Chosen toppings
    #[serde(default)]
    pub toppings: Vec<String>,
    /// Units ordered
    pub quantity: u32,
    /// Product image at purchase time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<&CartItem> for OrderItem {
    fn from(line: &CartItem) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            size: line.size,
            toppings: line.toppings.clone(),
            quantity: line.quantity,
            image_url: line.image_url.clone(),
        }
    }
}

/// A placed order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order id, also used as the payment reference
    pub id: OrderId,
    /// Owning user; `None` for guest orders until linked
    pub user_id: Option<UserId>,
    /// Saved address the order ships to, when one was resolved
    pub address_id: Option<AddressId>,
    /// Frozen lines
    pub items: Vec<OrderItem>,
    /// Sum of line totals at checkout time
    pub subtotal: Money,
    /// Flat delivery fee applied at checkout time
    pub delivery_fee: Money,
    /// Tax applied at checkout time
    pub tax: Money,
    /// `subtotal + delivery_fee + tax`
    pub total: Money,
    /// Chosen payment method
    pub payment_kind: PaymentKind,
    /// Contact details for guest orders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<GuestContact>,
    /// Fulfilment state
    pub status: OrderStatus,
    /// Payment state
    pub payment_status: PaymentStatus,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// When the order was last touched
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether `user` may read this order.
    ///
    /// Owned orders are visible to their owner only. Orders without an
    /// owner are visible to any caller holding the id, so guests can check
    /// on their own orders from the confirmation link.
    #[must_use]
    pub fn visible_to(&self, user: Option<UserId>) -> bool {
        match self.user_id {
            None => true,
            Some(owner) => user == Some(owner),
        }
    }
}

/// Input for creating an order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    /// Owning user, when the buyer is signed in
    pub user_id: Option<UserId>,
    /// Resolved delivery address, when one exists
    pub address_id: Option<AddressId>,
    /// Frozen lines
    pub items: Vec<OrderItem>,
    /// Pre-computed subtotal
    pub subtotal: Money,
    /// Pre-computed delivery fee
    pub delivery_fee: Money,
    /// Pre-computed tax
    pub tax: Money,
    /// Pre-computed grand total
    pub total: Money,
    /// Chosen payment method
    pub payment_kind: PaymentKind,
    /// Contact details when the buyer is a guest
    pub guest: Option<GuestContact>,
}

impl NewOrder {
    /// Whether the order names someone to deliver to: a signed-in user or
    /// a complete guest contact.
    #[must_use]
    pub fn has_recipient(&self) -> bool {
        self.user_id.is_some() || self.guest.as_ref().is_some_and(GuestContact::is_complete)
    }
}
