//! In-memory store implementations.
//!
//! `HashMap`-backed doubles for every persistence trait in `crust-core`,
//! enforcing the same invariants the Postgres implementations do: the
//! order status machine, per-user ownership scoping, and the
//! single-default rule for addresses and payment methods. Checkout and
//! handler tests that go through these stores exercise the real
//! orchestration logic at memory speed.
//!
//! The stores are `Clone`; clones share state, so a test can hand one
//! handle to the code under test and keep another for assertions.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after another panic

use chrono::Utc;
use crust_core::identity::Identity;
use crust_core::order::{NewOrder, Order, OrderStatus, PaymentStatus};
use crust_core::store::{
    Address, AddressInput, AddressStore, OrderStore, PaymentMethod, PaymentMethodInput,
    PaymentMethodStore, PaymentMethodUpdate, StoreError,
};
use crust_core::types::{AddressId, CurrentUser, OrderId, PaymentMethodId, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

// ============================================================================
// Orders
// ============================================================================

/// In-memory [`OrderStore`] for fast, deterministic testing.
#[derive(Clone, Debug)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Removes all orders (for test isolation).
    pub fn clear(&self) {
        self.orders.write().unwrap().clear();
    }

    /// Number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().unwrap().len()
    }

    /// Whether no orders are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.read().unwrap().is_empty()
    }

    /// Inserts an order as-is, bypassing [`OrderStore::create`].
    ///
    /// Lets tests start from any status without walking the machine.
    pub fn insert(&self, order: Order) {
        self.orders.write().unwrap().insert(order.id, order);
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn create(
        &self,
        input: NewOrder,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>> {
        Box::pin(async move {
            if !input.has_recipient() {
                return Err(StoreError::NotPermitted);
            }
            let now = Utc::now();
            let order = Order {
                id: OrderId::new(),
                user_id: input.user_id,
                address_id: input.address_id,
                items: input.items,
                subtotal: input.subtotal,
                delivery_fee: input.delivery_fee,
                tax: input.tax,
                total: input.total,
                payment_kind: input.payment_kind,
                guest: input.guest,
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            self.orders
                .write()
                .unwrap()
                .insert(order.id, order.clone());
            Ok(order)
        })
    }

    fn get(
        &self,
        id: OrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Order>, StoreError>> + Send + '_>> {
        Box::pin(async move { Ok(self.orders.read().unwrap().get(&id).cloned()) })
    }

    fn list_for_user(
        &self,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Order>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let orders = self.orders.read().unwrap();
            let mut rows: Vec<Order> = orders
                .values()
                .filter(|o| o.user_id == Some(user))
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        })
    }

    fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut orders = self.orders.write().unwrap();
            let order = orders.get_mut(&id).ok_or(StoreError::NotFound)?;
            if !order.status.can_transition(status) {
                return Err(StoreError::InvalidTransition {
                    from: order.status.to_string(),
                    to: status.to_string(),
                });
            }
            order.status = status;
            order.updated_at = Utc::now();
            Ok(order.clone())
        })
    }

    fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut orders = self.orders.write().unwrap();
            let order = orders.get_mut(&id).ok_or(StoreError::NotFound)?;
            // Re-delivering the current status is a no-op so callback
            // retries stay safe.
            if order.payment_status == status {
                return Ok(order.clone());
            }
            if order.payment_status != PaymentStatus::Pending {
                return Err(StoreError::InvalidTransition {
                    from: order.payment_status.to_string(),
                    to: status.to_string(),
                });
            }
            order.payment_status = status;
            if status == PaymentStatus::Paid && order.status == OrderStatus::Pending {
                order.status = OrderStatus::Confirmed;
            }
            order.updated_at = Utc::now();
            Ok(order.clone())
        })
    }

    fn cancel(
        &self,
        id: OrderId,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut orders = self.orders.write().unwrap();
            let order = orders.get_mut(&id).ok_or(StoreError::NotFound)?;
            if order.user_id != Some(user) {
                return Err(StoreError::NotFound);
            }
            if !order.status.is_cancellable() {
                return Err(StoreError::InvalidTransition {
                    from: order.status.to_string(),
                    to: OrderStatus::Cancelled.to_string(),
                });
            }
            order.status = OrderStatus::Cancelled;
            order.updated_at = Utc::now();
            Ok(order.clone())
        })
    }

    fn link_to_user(
        &self,
        id: OrderId,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Order, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut orders = self.orders.write().unwrap();
            let order = orders.get_mut(&id).ok_or(StoreError::NotFound)?;
            if order.user_id.is_some() {
                return Err(StoreError::AlreadyLinked);
            }
            order.user_id = Some(user);
            order.updated_at = Utc::now();
            Ok(order.clone())
        })
    }
}

// ============================================================================
// Addresses
// ============================================================================

/// In-memory [`AddressStore`] with the single-default invariant.
#[derive(Clone, Debug)]
pub struct InMemoryAddressStore {
    addresses: Arc<RwLock<HashMap<AddressId, Address>>>,
}

impl InMemoryAddressStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            addresses: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Removes all addresses (for test isolation).
    pub fn clear(&self) {
        self.addresses.write().unwrap().clear();
    }

    /// Number of stored addresses, across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.read().unwrap().len()
    }

    /// Whether no addresses are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.read().unwrap().is_empty()
    }
}

impl Default for InMemoryAddressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressStore for InMemoryAddressStore {
    fn list(
        &self,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Address>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let addresses = self.addresses.read().unwrap();
            let mut rows: Vec<Address> = addresses
                .values()
                .filter(|a| a.user_id == user)
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                b.is_default
                    .cmp(&a.is_default)
                    .then(b.created_at.cmp(&a.created_at))
            });
            Ok(rows)
        })
    }

    fn get(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Address>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            Ok(self
                .addresses
                .read()
                .unwrap()
                .get(&id)
                .filter(|a| a.user_id == user)
                .cloned())
        })
    }

    fn default_for(
        &self,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Address>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            Ok(self
                .addresses
                .read()
                .unwrap()
                .values()
                .find(|a| a.user_id == user && a.is_default)
                .cloned())
        })
    }

    fn create(
        &self,
        user: UserId,
        input: AddressInput,
    ) -> Pin<Box<dyn Future<Output = Result<Address, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut addresses = self.addresses.write().unwrap();
            let has_any = addresses.values().any(|a| a.user_id == user);
            // The first address becomes the default automatically.
            let make_default = input.is_default || !has_any;
            if make_default {
                for existing in addresses.values_mut().filter(|a| a.user_id == user) {
                    existing.is_default = false;
                }
            }
            let country = input.country_or_default();
            let now = Utc::now();
            let address = Address {
                id: AddressId::new(),
                user_id: user,
                label: input.label,
                street: input.street,
                city: input.city,
                state: input.state,
                zip: input.zip,
                country,
                is_default: make_default,
                created_at: now,
                updated_at: now,
            };
            addresses.insert(address.id, address.clone());
            Ok(address)
        })
    }

    fn update(
        &self,
        user: UserId,
        id: AddressId,
        input: AddressInput,
    ) -> Pin<Box<dyn Future<Output = Result<Address, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut addresses = self.addresses.write().unwrap();
            if !addresses.get(&id).is_some_and(|a| a.user_id == user) {
                return Err(StoreError::NotFound);
            }
            if input.is_default {
                for existing in addresses
                    .values_mut()
                    .filter(|a| a.user_id == user && a.id != id)
                {
                    existing.is_default = false;
                }
            }
            let country = input.country_or_default();
            let address = addresses.get_mut(&id).ok_or(StoreError::NotFound)?;
            address.label = input.label;
            address.street = input.street;
            address.city = input.city;
            address.state = input.state;
            address.zip = input.zip;
            address.country = country;
            address.is_default = input.is_default;
            address.updated_at = Utc::now();
            Ok(address.clone())
        })
    }

    fn delete(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut addresses = self.addresses.write().unwrap();
            if !addresses.get(&id).is_some_and(|a| a.user_id == user) {
                return Err(StoreError::NotFound);
            }
            addresses.remove(&id);
            Ok(())
        })
    }
}

// ============================================================================
// Payment methods
// ============================================================================

/// In-memory [`PaymentMethodStore`] with the single-default invariant.
#[derive(Clone, Debug)]
pub struct InMemoryPaymentMethodStore {
    methods: Arc<RwLock<HashMap<PaymentMethodId, PaymentMethod>>>,
}

impl InMemoryPaymentMethodStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Removes all methods (for test isolation).
    pub fn clear(&self) {
        self.methods.write().unwrap().clear();
    }

    /// Number of stored methods, across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.read().unwrap().len()
    }

    /// Whether no methods are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.read().unwrap().is_empty()
    }
}

impl Default for InMemoryPaymentMethodStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentMethodStore for InMemoryPaymentMethodStore {
    fn list(
        &self,
        user: UserId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PaymentMethod>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let methods = self.methods.read().unwrap();
            let mut rows: Vec<PaymentMethod> = methods
                .values()
                .filter(|m| m.user_id == user)
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                b.is_default
                    .cmp(&a.is_default)
                    .then(b.created_at.cmp(&a.created_at))
            });
            Ok(rows)
        })
    }

    fn create(
        &self,
        user: UserId,
        input: PaymentMethodInput,
    ) -> Pin<Box<dyn Future<Output = Result<PaymentMethod, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut methods = self.methods.write().unwrap();
            let has_any = methods.values().any(|m| m.user_id == user);
            // The first method becomes the default automatically.
            let make_default = input.is_default || !has_any;
            if make_default {
                for existing in methods.values_mut().filter(|m| m.user_id == user) {
                    existing.is_default = false;
                }
            }
            let now = Utc::now();
            let method = PaymentMethod {
                id: PaymentMethodId::new(),
                user_id: user,
                kind: input.kind,
                provider: input.provider,
                last4: input.last4,
                phone: input.phone,
                holder_name: input.holder_name,
                is_default: make_default,
                created_at: now,
                updated_at: now,
            };
            methods.insert(method.id, method.clone());
            Ok(method)
        })
    }

    fn update(
        &self,
        user: UserId,
        id: PaymentMethodId,
        update: PaymentMethodUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<PaymentMethod, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut methods = self.methods.write().unwrap();
            if !methods.get(&id).is_some_and(|m| m.user_id == user) {
                return Err(StoreError::NotFound);
            }
            if update.is_default == Some(true) {
                for existing in methods
                    .values_mut()
                    .filter(|m| m.user_id == user && m.id != id)
                {
                    existing.is_default = false;
                }
            }
            let method = methods.get_mut(&id).ok_or(StoreError::NotFound)?;
            if let Some(is_default) = update.is_default {
                method.is_default = is_default;
            }
            if let Some(holder) = update.holder_name {
                method.holder_name = Some(holder).filter(|h| !h.trim().is_empty());
            }
            method.updated_at = Utc::now();
            Ok(method.clone())
        })
    }

    fn delete(
        &self,
        user: UserId,
        id: PaymentMethodId,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut methods = self.methods.write().unwrap();
            if !methods.get(&id).is_some_and(|m| m.user_id == user) {
                return Err(StoreError::NotFound);
            }
            methods.remove(&id);
            Ok(())
        })
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Token-map [`Identity`] resolver.
///
/// Tests register `(token, user)` pairs up front; any other token
/// resolves to `None`, the same as an expired session.
#[derive(Clone, Debug)]
pub struct MockIdentity {
    sessions: Arc<RwLock<HashMap<String, CurrentUser>>>,
}

impl MockIdentity {
    /// Creates a resolver with no sessions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a session token resolving to `user`.
    pub fn insert(&self, token: impl Into<String>, user: CurrentUser) {
        self.sessions.write().unwrap().insert(token.into(), user);
    }

    /// Removes all sessions (for test isolation).
    pub fn clear(&self) {
        self.sessions.write().unwrap().clear();
    }
}

impl Default for MockIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl Identity for MockIdentity {
    fn resolve(
        &self,
        token: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<CurrentUser>, StoreError>> + Send + '_>> {
        let token = token.to_string();
        Box::pin(async move { Ok(self.sessions.read().unwrap().get(&token).cloned()) })
    }
}
