//! Domain types for the Crust ordering backend.
//!
//! This module contains the identifiers and shared value objects used across
//! the cart, checkout, and order lifecycle: UUID-backed id newtypes, integer
//! money amounts, pizza sizes, and the contact details captured for guest
//! orders.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a registered user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a saved delivery address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressId(Uuid);

impl AddressId {
    /// Creates a new random `AddressId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `AddressId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AddressId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a saved payment method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentMethodId(Uuid);

impl PaymentMethodId {
    /// Creates a new random `PaymentMethodId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PaymentMethodId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PaymentMethodId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentMethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a cart line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItemId(Uuid);

impl CartItemId {
    /// Creates a new random `CartItemId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `CartItemId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CartItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CartItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in pesewas (1/100 of a Ghanaian cedi)
///
/// Stored as an unsigned integer to avoid floating-point issues.
/// All arithmetic is explicit about overflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from pesewas
    #[must_use]
    pub const fn from_pesewas(pesewas: u64) -> Self {
        Self(pesewas)
    }

    /// Creates a `Money` value from whole cedis
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (cedis * 100 > `u64::MAX`).
    /// Use `checked_from_cedis` for non-panicking conversion.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_cedis(cedis: u64) -> Self {
        match cedis.checked_mul(100) {
            Some(pesewas) => Self(pesewas),
            None => panic!("Money::from_cedis overflow"),
        }
    }

    /// Creates a `Money` value from whole cedis with overflow checking
    #[must_use]
    pub const fn checked_from_cedis(cedis: u64) -> Option<Self> {
        match cedis.checked_mul(100) {
            Some(pesewas) => Some(Self(pesewas)),
            None => None,
        }
    }

    /// Returns the amount in pesewas
    #[must_use]
    pub const fn pesewas(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole cedis (rounded down)
    #[must_use]
    pub const fn cedis(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Applies a rate expressed in basis points (1/100 of a percent),
    /// rounding down, with overflow checking
    ///
    /// Used for tax: `subtotal.checked_rate_bps(300)` is 3% of the subtotal.
    #[must_use]
    pub const fn checked_rate_bps(self, bps: u32) -> Option<Self> {
        match self.0.checked_mul(bps as u64) {
            Some(product) => Some(Self(product / 10_000)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GHS {}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Value objects
// ============================================================================

/// Pizza size for a cart or order line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PizzaSize {
    /// Small pizza
    Small,
    /// Medium pizza
    Medium,
    /// Large pizza
    Large,
}

impl PizzaSize {
    /// Canonical lowercase label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for PizzaSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details captured for orders placed without an account
///
/// All three fields must be present for a guest order to be accepted;
/// [`GuestContact::is_complete`] is the single gate for that rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    /// Recipient name
    pub name: String,
    /// Contact phone number (local format)
    pub phone: String,
    /// Free-form delivery address
    pub address: String,
}

impl GuestContact {
    /// Whether every field carries a non-blank value
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.phone.trim().is_empty()
            && !self.address.trim().is_empty()
    }
}

/// A resolved, authenticated user as seen by this subsystem
///
/// Produced by the identity collaborator; nothing here knows how the
/// user signed in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// The user's id
    pub id: UserId,
    /// Display name, used on payment descriptions
    pub name: String,
    /// Profile phone number, if the account has one
    pub phone: Option<String>,
}
