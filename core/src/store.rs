//! Persistence capability traits and the registry entities behind them.
//!
//! The checkout orchestrator and the web layer only ever see these traits;
//! Postgres implementations live in `crust-postgres` and in-memory ones in
//! `crust-testing`. All traits use explicit boxed futures so they can be
//! held as `Arc<dyn …>` trait objects.

use crate::checkout::{FieldError, FieldErrors};
use crate::order::{NewOrder, Order, OrderStatus, PaymentStatus};
use crate::phone;
use crate::types::{AddressId, OrderId, PaymentMethodId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Country written on addresses that do not specify one.
pub const DEFAULT_COUNTRY: &str = "Ghana";

/// Errors surfaced by the persistence layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Row missing, or present but owned by someone else. Ownership
    /// mismatches collapse into this variant so another user's records
    /// are never confirmed to exist.
    #[error("record not found")]
    NotFound,

    /// The caller exists but may not perform this operation.
    #[error("operation not permitted")]
    NotPermitted,

    /// The requested status change is not a legal edge of the relevant
    /// state machine.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Status the order is currently in
        from: String,
        /// Status the caller asked for
        to: String,
    },

    /// The order already belongs to an account and cannot be re-linked.
    #[error("order is already linked to an account")]
    AlreadyLinked,

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(String),
}

// ============================================================================
// Addresses
// ============================================================================

/// A saved delivery address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address id
    pub id: AddressId,
    /// Owning user
    pub user_id: UserId,
    /// Short label shown in pickers ("Home", "Office")
    pub label: String,
    /// Street line
    pub street: String,
    /// City or town
    pub city: String,
    /// Region/state, where applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code, where applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// Country, defaulting to [`DEFAULT_COUNTRY`]
    pub country: String,
    /// Whether this is the user's pre-selected address
    pub is_default: bool,
    /// When the address was saved
    pub created_at: DateTime<Utc>,
    /// When the address was last modified
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or fully updating an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    /// Short label shown in pickers
    pub label: String,
    /// Street line
    pub street: String,
    /// City or town
    pub city: String,
    /// Region/state
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code
    #[serde(default)]
    pub zip: Option<String>,
    /// Country; omitted means [`DEFAULT_COUNTRY`]
    #[serde(default)]
    pub country: Option<String>,
    /// Whether to make this the default address
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Checks the required fields, keyed per field.
    ///
    /// # Errors
    ///
    /// One [`FieldError`] per blank required field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.label.trim().is_empty() {
            errors.push(FieldError::new("label", "label is required"));
        }
        if self.street.trim().is_empty() {
            errors.push(FieldError::new("street", "street is required"));
        }
        if self.city.trim().is_empty() {
            errors.push(FieldError::new("city", "city is required"));
        }
        errors.into_result()
    }

    /// Country to persist, applying the default.
    #[must_use]
    pub fn country_or_default(&self) -> String {
        match &self.country {
            Some(c) if !c.trim().is_empty() => c.clone(),
            _ => DEFAULT_COUNTRY.to_string(),
        }
    }
}

// ============================================================================
// Payment methods
// ============================================================================

/// The two shapes of saved payment instrument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    /// A mobile-money wallet identified by phone number
    MobileMoney,
    /// A payment card identified by its last four digits
    Card,
}

impl PaymentMethodKind {
    /// Canonical wire/storage label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MobileMoney => "mobile_money",
            Self::Card => "card",
        }
    }

    /// Parses a canonical label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mobile_money" => Some(Self::MobileMoney),
            "card" => Some(Self::Card),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved payment method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Payment method id
    pub id: PaymentMethodId,
    /// Owning user
    pub user_id: UserId,
    /// Instrument shape
    pub kind: PaymentMethodKind,
    /// Display label: detected provider for mobile money, freeform for cards
    pub provider: String,
    /// Last four digits of the phone or card number
    pub last4: String,
    /// Full wallet phone number (mobile money only, local format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Cardholder name (cards only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    /// Whether this is the user's pre-selected method
    pub is_default: bool,
    /// When the method was saved
    pub created_at: DateTime<Utc>,
    /// When the method was last modified
    pub updated_at: DateTime<Utc>,
}

/// Validated payload for saving a payment method.
///
/// Built through [`PaymentMethodInput::mobile_money`] or
/// [`PaymentMethodInput::card`] so the provider label and last-4 digits are
/// always derived the same way, whether the save comes from account
/// management or implicitly from checkout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentMethodInput {
    /// Instrument shape
    pub kind: PaymentMethodKind,
    /// Display label
    pub provider: String,
    /// Last four digits
    pub last4: String,
    /// Wallet phone (mobile money only, local format)
    pub phone: Option<String>,
    /// Cardholder name (cards only)
    pub holder_name: Option<String>,
    /// Whether to make this the default method
    pub is_default: bool,
}

impl PaymentMethodInput {
    /// Builds a mobile-money method from a phone number, deriving the
    /// provider from the prefix table.
    ///
    /// # Errors
    ///
    /// A `phone`-keyed [`FieldError`] when the number is not a valid local
    /// mobile number.
    pub fn mobile_money(phone_raw: &str, is_default: bool) -> Result<Self, FieldErrors> {
        let Some(local) = phone::to_local(phone_raw) else {
            return Err(FieldErrors::single(
                "phone",
                "enter a valid mobile money number (e.g. 0241234567)",
            ));
        };
        let provider = phone::detect_provider(&local).label().to_string();
        let last4 = local[local.len() - 4..].to_string();
        Ok(Self {
            kind: PaymentMethodKind::MobileMoney,
            provider,
            last4,
            phone: Some(local),
            holder_name: None,
            is_default,
        })
    }

    /// Builds a card method from a card number, keeping only the last four
    /// digits.
    ///
    /// # Errors
    ///
    /// A `card_number`-keyed [`FieldError`] when the number is not sixteen
    /// digits after whitespace is stripped.
    pub fn card(
        number: &str,
        holder_name: Option<String>,
        provider: Option<String>,
        is_default: bool,
    ) -> Result<Self, FieldErrors> {
        let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(FieldErrors::single(
                "card_number",
                "card number must be 16 digits",
            ));
        }
        let provider = match provider {
            Some(p) if !p.trim().is_empty() => p,
            _ => "Card".to_string(),
        };
        Ok(Self {
            kind: PaymentMethodKind::Card,
            provider,
            last4: digits[12..].to_string(),
            phone: None,
            holder_name: holder_name.filter(|h| !h.trim().is_empty()),
            is_default,
        })
    }
}

/// Partial update for a saved payment method.
///
/// Instrument numbers are immutable once saved; only the default flag and
/// the cardholder name can change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodUpdate {
    /// New default flag, when present
    #[serde(default)]
    pub is_default: Option<bool>,
    /// New cardholder name, when present
    #[serde(default)]
    pub holder_name: Option<String>,
}

// ============================================================================
// Store traits
// ============================================================================

/// Order persistence.
///
/// The store, not its callers, is the authority on the order state
/// machine: implementations must reject any transition
/// [`OrderStatus::can_transition`] forbids, from whatever path.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` to enable trait object usage (`Arc<dyn OrderStore>`).
pub trait OrderStore: Send + Sync {
    /// Persists a new order atomically: snapshot, totals, and
    /// guest/user fields land together or not at all.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotPermitted`] when the input names no recipient,
    /// [`StoreError::Database`] on storage failure.
    fn create(
        &self,
        input: NewOrder,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>>;

    /// Fetches an order by id. Visibility is the caller's concern (see
    /// [`Order::visible_to`]).
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on storage failure.
    fn get(
        &self,
        id: OrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Order>, StoreError>> + Send + '_>>;

    /// All orders owned by `user`, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on storage failure.
    fn list_for_user(
        &self,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Order>, StoreError>> + Send + '_>>;

    /// Moves an order along the fulfilment machine.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidTransition`] for any edge the machine
    /// forbids, [`StoreError::NotFound`] for unknown orders.
    fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>>;

    /// Records the payment outcome. `Paid` also advances a still-`PENDING`
    /// order to `CONFIRMED`; `Failed` leaves the order status alone.
    /// Re-delivering the current payment status is a no-op, so callback
    /// retries are safe.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidTransition`] when the payment status is
    /// already settled differently, [`StoreError::NotFound`] for unknown
    /// orders.
    fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>>;

    /// Customer-initiated cancellation: only the owning user, and only
    /// while the order is still `PENDING` or `CONFIRMED`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown or foreign orders,
    /// [`StoreError::InvalidTransition`] once preparation has started.
    fn cancel(
        &self,
        id: OrderId,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>>;

    /// Attaches a guest order to a freshly created account. Only orders
    /// with no owner can be linked; linking is one-directional and
    /// happens at most once.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyLinked`] when the order has an owner,
    /// [`StoreError::NotFound`] for unknown orders.
    fn link_to_user(
        &self,
        id: OrderId,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>>;
}

/// Saved-address registry, strictly per-user.
///
/// # Dyn Compatibility
///
/// Boxed futures for `Arc<dyn AddressStore>` usage.
pub trait AddressStore: Send + Sync {
    /// The user's addresses: default first, then newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on storage failure.
    fn list(
        &self,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Address>, StoreError>> + Send + '_>>;

    /// Fetches one of the user's addresses. Foreign or unknown ids come
    /// back as `None`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on storage failure.
    fn get(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Address>, StoreError>> + Send + '_>>;

    /// The user's default address, if any.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on storage failure.
    fn default_for(
        &self,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Address>, StoreError>> + Send + '_>>;

    /// Saves an address. `is_default = true` clears every other default
    /// the user has, in the same transaction as the write.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on storage failure.
    fn create(
        &self,
        user: UserId,
        input: AddressInput,
    ) -> Pin<Box<dyn Future<Output = Result<Address, StoreError>> + Send + '_>>;

    /// Rewrites an address the user owns, with the same default-clearing
    /// rule (excluding the row itself).
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id is unknown or owned by
    /// someone else.
    fn update(
        &self,
        user: UserId,
        id: AddressId,
        input: AddressInput,
    ) -> Pin<Box<dyn Future<Output = Result<Address, StoreError>> + Send + '_>>;

    /// Deletes an address the user owns.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id is unknown or owned by
    /// someone else.
    fn delete(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}

/// Saved-payment-method registry, strictly per-user.
///
/// # Dyn Compatibility
///
/// Boxed futures for `Arc<dyn PaymentMethodStore>` usage.
pub trait PaymentMethodStore: Send + Sync {
    /// The user's methods: default first, then newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on storage failure.
    fn list(
        &self,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PaymentMethod>, StoreError>> + Send + '_>>;

    /// Saves a method. `is_default = true` clears every other default the
    /// user has, in the same transaction as the write.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on storage failure.
    fn create(
        &self,
        user: UserId,
        input: PaymentMethodInput,
    ) -> Pin<Box<dyn Future<Output = Result<PaymentMethod, StoreError>> + Send + '_>>;

    /// Applies a partial update to a method the user owns, with the same
    /// default-clearing rule (excluding the row itself).
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id is unknown or owned by
    /// someone else.
    fn update(
        &self,
        user: UserId,
        id: PaymentMethodId,
        update: PaymentMethodUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<PaymentMethod, StoreError>> + Send + '_>>;

    /// Deletes a method the user owns.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id is unknown or owned by
    /// someone else.
    fn delete(
        &self,
        user: UserId,
        id: PaymentMethodId,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}
