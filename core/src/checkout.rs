//! Checkout orchestration.
//!
//! [`CheckoutService::process`] turns a cart and a payment selection into a
//! persisted order, running a fixed sequence of hard gates: payment
//! validation, empty-cart rejection, address resolution, totals, order
//! creation, then the payment branch. Nothing after the order is
//! committed is fatal: a mobile-money push that cannot be initiated
//! leaves a `PENDING` order behind rather than rolling back, and
//! reconciliation happens through the payment callback.

use crate::cart::Cart;
use crate::gateway::{PaymentGateway, PaymentRequest};
use crate::order::{NewOrder, Order, OrderItem, PaymentKind, PaymentStatus};
use crate::phone;
use crate::store::{AddressStore, OrderStore, PaymentMethodInput, PaymentMethodStore, StoreError};
use crate::types::{AddressId, CurrentUser, GuestContact, Money, OrderId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Default flat delivery fee, in pesewas (GHS 15.00).
pub const DEFAULT_DELIVERY_FEE_PESEWAS: u64 = 1500;

/// Default tax rate, in basis points (3%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 300;

// ============================================================================
// Field-keyed validation errors
// ============================================================================

/// One validation failure, keyed by the offending request field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Request field the message applies to
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A collection of field errors, serialized as a bare array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a collection holding a single error.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    /// Appends an error.
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Whether no errors were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The collected errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(())` when empty, `Err(self)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns itself when any error was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

// ============================================================================
// Payment selection
// ============================================================================

/// The payment details submitted with a checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentSelection {
    /// Card payment details
    Card {
        /// Card number; internal whitespace is tolerated
        number: String,
        /// Cardholder name
        holder: String,
        /// Expiry in `MM/YY` form
        expiry: String,
        /// 3-4 digit security code
        cvc: String,
    },
    /// Mobile-money wallet
    MobileMoney {
        /// Wallet number in local format
        phone: String,
    },
    /// Pay the rider on arrival
    CashOnDelivery,
}

impl PaymentSelection {
    /// The order-level payment kind this selection maps to.
    #[must_use]
    pub const fn kind(&self) -> PaymentKind {
        match self {
            Self::Card { .. } => PaymentKind::Card,
            Self::MobileMoney { .. } => PaymentKind::MobileMoney,
            Self::CashOnDelivery => PaymentKind::CashOnDelivery,
        }
    }

    /// Validates the selection, collecting every failing field.
    ///
    /// # Errors
    ///
    /// Field-keyed messages: `number`/`holder`/`expiry`/`cvc` for cards,
    /// `phone` for mobile money. Cash on delivery never fails.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        match self {
            Self::Card {
                number,
                holder,
                expiry,
                cvc,
            } => {
                let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
                if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
                    errors.push(FieldError::new("number", "card number must be 16 digits"));
                }
                if holder.trim().is_empty() {
                    errors.push(FieldError::new("holder", "cardholder name is required"));
                }
                if !is_valid_expiry(expiry) {
                    errors.push(FieldError::new("expiry", "expiry must be MM/YY"));
                }
                let cvc = cvc.trim();
                if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
                    errors.push(FieldError::new("cvc", "CVC must be 3 or 4 digits"));
                }
            }
            Self::MobileMoney { phone } => {
                if phone::to_local(phone).is_none() {
                    errors.push(FieldError::new(
                        "phone",
                        "enter a valid mobile money number (e.g. 0241234567)",
                    ));
                }
            }
            Self::CashOnDelivery => {}
        }
        errors.into_result()
    }
}

fn is_valid_expiry(expiry: &str) -> bool {
    let expiry = expiry.trim();
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let month_ok = month.len() == 2
        && month.chars().all(|c| c.is_ascii_digit())
        && matches!(month.parse::<u8>(), Ok(1..=12));
    let year_ok = year.len() == 2 && year.chars().all(|c| c.is_ascii_digit());
    month_ok && year_ok
}

// ============================================================================
// Pricing and totals
// ============================================================================

/// Fee and tax knobs applied at checkout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricingConfig {
    /// Flat delivery fee added to every order
    pub delivery_fee: Money,
    /// Tax rate in basis points, applied to the subtotal
    pub tax_rate_bps: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            delivery_fee: Money::from_pesewas(DEFAULT_DELIVERY_FEE_PESEWAS),
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
        }
    }
}

/// The money breakdown frozen onto an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Sum of line totals
    pub subtotal: Money,
    /// Flat fee from [`PricingConfig`]
    pub delivery_fee: Money,
    /// `subtotal × tax_rate`, rounded down
    pub tax: Money,
    /// `subtotal + delivery_fee + tax`
    pub total: Money,
}

impl Totals {
    /// Computes totals from a cart snapshot. These values are computed
    /// once, frozen onto the order, and never re-derived.
    #[must_use]
    pub fn compute(cart: &Cart, pricing: &PricingConfig) -> Self {
        let subtotal = cart.summary().total;
        let tax = subtotal
            .checked_rate_bps(pricing.tax_rate_bps)
            .unwrap_or(Money::from_pesewas(u64::MAX));
        let total = subtotal
            .checked_add(pricing.delivery_fee)
            .and_then(|t| t.checked_add(tax))
            .unwrap_or(Money::from_pesewas(u64::MAX));
        Self {
            subtotal,
            delivery_fee: pricing.delivery_fee,
            tax,
            total,
        }
    }
}

// ============================================================================
// Checkout service
// ============================================================================

/// The full checkout submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Payment details
    pub payment: PaymentSelection,
    /// Saved address to deliver to; only meaningful for signed-in buyers
    #[serde(default)]
    pub address_id: Option<AddressId>,
    /// Contact details; required when no user is signed in
    #[serde(default)]
    pub contact: Option<GuestContact>,
}

/// What a successful checkout hands back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutOutcome {
    /// The new order
    pub order_id: OrderId,
    /// Grand total charged or to be collected
    pub total: Money,
    /// Echo of the submitted contact for guest checkouts, so the caller
    /// can offer a "save this as an account" follow-up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_contact: Option<GuestContact>,
}

/// Errors a checkout can end with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// One or more request fields failed validation.
    #[error("checkout validation failed")]
    Validation(FieldErrors),

    /// The cart has nothing in it.
    #[error("cart is empty")]
    EmptyCart,

    /// Order persistence failed; the checkout as a whole failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Orchestrates cart → order → payment.
pub struct CheckoutService {
    orders: Arc<dyn OrderStore>,
    addresses: Arc<dyn AddressStore>,
    payment_methods: Arc<dyn PaymentMethodStore>,
    gateway: Arc<dyn PaymentGateway>,
    pricing: PricingConfig,
    callback_url: String,
}

impl CheckoutService {
    /// Wires the orchestrator to its collaborators.
    pub fn new(
        orders: Arc<dyn OrderStore>,
        addresses: Arc<dyn AddressStore>,
        payment_methods: Arc<dyn PaymentMethodStore>,
        gateway: Arc<dyn PaymentGateway>,
        pricing: PricingConfig,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            addresses,
            payment_methods,
            gateway,
            pricing,
            callback_url: callback_url.into(),
        }
    }

    /// Runs a checkout end to end.
    ///
    /// The caller is responsible for clearing the cart cookie on success;
    /// this method never mutates the cart.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Validation`] for bad payment details, an
    /// unresolvable address id, or missing guest contact fields;
    /// [`CheckoutError::EmptyCart`] for an empty cart;
    /// [`CheckoutError::Storage`] when order creation fails.
    #[tracing::instrument(skip_all, fields(payment = %request.payment.kind(), authenticated = user.is_some()))]
    pub async fn process(
        &self,
        cart: &Cart,
        request: CheckoutRequest,
        user: Option<&CurrentUser>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        request
            .payment
            .validate()
            .map_err(CheckoutError::Validation)?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let address_id = self.resolve_address(user, request.address_id).await?;
        let totals = Totals::compute(cart, &self.pricing);

        let guest = match user {
            Some(_) => None,
            None => Some(validated_guest(request.contact.clone())?),
        };

        let order = self
            .orders
            .create(NewOrder {
                user_id: user.map(|u| u.id),
                address_id,
                items: cart.items().iter().map(OrderItem::from).collect(),
                subtotal: totals.subtotal,
                delivery_fee: totals.delivery_fee,
                tax: totals.tax,
                total: totals.total,
                payment_kind: request.payment.kind(),
                guest,
            })
            .await?;

        tracing::info!(order_id = %order.id, total = order.total.pesewas(), "order created");

        if let (Some(u), PaymentSelection::MobileMoney { phone }) = (user, &request.payment) {
            self.save_momo_method(u, phone).await;
        }

        match &request.payment {
            PaymentSelection::Card { .. } => {
                // Stand-in for a real card processor: settle on the spot.
                self.orders
                    .update_payment_status(order.id, PaymentStatus::Paid)
                    .await?;
            }
            PaymentSelection::MobileMoney { phone } => {
                self.initiate_momo_payment(&order, phone, user).await;
            }
            PaymentSelection::CashOnDelivery => {}
        }

        Ok(CheckoutOutcome {
            order_id: order.id,
            total: order.total,
            guest_contact: order.guest,
        })
    }

    async fn resolve_address(
        &self,
        user: Option<&CurrentUser>,
        explicit: Option<AddressId>,
    ) -> Result<Option<AddressId>, CheckoutError> {
        match (user, explicit) {
            (Some(u), Some(id)) => match self.addresses.get(u.id, id).await? {
                Some(address) => Ok(Some(address.id)),
                None => Err(CheckoutError::Validation(FieldErrors::single(
                    "address_id",
                    "address not found",
                ))),
            },
            (Some(u), None) => Ok(self.addresses.default_for(u.id).await?.map(|a| a.id)),
            // Guests deliver to the contact address; saved addresses do
            // not apply.
            (None, _) => Ok(None),
        }
    }

    /// Saves the wallet used at checkout into the registry when it is not
    /// already there. Best-effort: a registry failure must not fail a
    /// checkout whose order is already committed.
    async fn save_momo_method(&self, user: &CurrentUser, phone: &str) {
        let Some(local) = phone::to_local(phone) else {
            return;
        };
        let existing = match self.payment_methods.list(user.id).await {
            Ok(existing) => existing,
            Err(error) => {
                tracing::warn!(user_id = %user.id, %error, "skipping payment method save");
                return;
            }
        };
        if existing
            .iter()
            .any(|m| m.phone.as_deref() == Some(local.as_str()))
        {
            return;
        }
        let Ok(input) = PaymentMethodInput::mobile_money(&local, existing.is_empty()) else {
            return;
        };
        match self.payment_methods.create(user.id, input).await {
            Ok(method) => {
                tracing::debug!(user_id = %user.id, method_id = %method.id, "saved payment method from checkout");
            }
            Err(error) => {
                tracing::warn!(user_id = %user.id, %error, "failed to save payment method");
            }
        }
    }

    /// Fires the push-payment request. Failures are logged and swallowed:
    /// the order is already authoritative and stays `PENDING` until the
    /// callback or a manual retry settles it.
    async fn initiate_momo_payment(&self, order: &Order, phone: &str, user: Option<&CurrentUser>) {
        let Some(msisdn) = phone::normalize_msisdn(phone) else {
            tracing::warn!(order_id = %order.id, "momo phone failed normalization after validation");
            return;
        };
        let customer_name = user
            .map(|u| u.name.clone())
            .or_else(|| order.guest.as_ref().map(|g| g.name.clone()))
            .unwrap_or_else(|| "Customer".to_string());

        let request = PaymentRequest {
            reference: order.id.to_string(),
            amount: order.total,
            customer_name,
            msisdn,
            description: "Crust pizza order".to_string(),
            callback_url: self.callback_url.clone(),
        };
        match self.gateway.initiate(&request).await {
            Ok(receipt) => {
                tracing::info!(
                    order_id = %order.id,
                    status = %receipt.status,
                    transaction_id = receipt.transaction_id.as_deref().unwrap_or("-"),
                    "payment initiated"
                );
            }
            Err(error) => {
                tracing::warn!(
                    order_id = %order.id,
                    %error,
                    "payment initiation failed; order remains pending"
                );
            }
        }
    }
}

fn validated_guest(contact: Option<GuestContact>) -> Result<GuestContact, CheckoutError> {
    let contact = contact.unwrap_or(GuestContact {
        name: String::new(),
        phone: String::new(),
        address: String::new(),
    });
    let mut errors = FieldErrors::new();
    if contact.name.trim().is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    }
    if contact.phone.trim().is_empty() {
        errors.push(FieldError::new("phone", "phone is required"));
    }
    if contact.address.trim().is_empty() {
        errors.push(FieldError::new("address", "delivery address is required"));
    }
    errors
        .into_result()
        .map(|()| contact)
        .map_err(CheckoutError::Validation)
}
