//! Tests for the in-memory store doubles.
//!
//! These stores stand in for Postgres in checkout and handler tests, so
//! they must enforce the same rules: the order status machine, payment
//! settlement semantics, ownership scoping, and the single-default
//! invariant.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use crust_core::identity::Identity;
use crust_core::order::{NewOrder, OrderItem, OrderStatus, PaymentKind, PaymentStatus};
use crust_core::store::{
    AddressInput, AddressStore, OrderStore, PaymentMethodInput, PaymentMethodStore,
    PaymentMethodUpdate, StoreError, DEFAULT_COUNTRY,
};
use crust_core::types::{AddressId, Money, OrderId, UserId};
use crust_testing::{
    fixtures, InMemoryAddressStore, InMemoryOrderStore, InMemoryPaymentMethodStore, MockIdentity,
};

fn new_order(user_id: Option<UserId>) -> NewOrder {
    NewOrder {
        user_id,
        address_id: None,
        items: fixtures::sample_cart()
            .items()
            .iter()
            .map(OrderItem::from)
            .collect(),
        subtotal: Money::from_pesewas(23_000),
        delivery_fee: Money::from_pesewas(1500),
        tax: Money::from_pesewas(690),
        total: Money::from_pesewas(25_190),
        payment_kind: PaymentKind::CashOnDelivery,
        guest: if user_id.is_none() {
            Some(fixtures::guest_contact())
        } else {
            None
        },
    }
}

fn address(label: &str, is_default: bool) -> AddressInput {
    AddressInput {
        label: label.to_string(),
        street: "12 Oxford Street".to_string(),
        city: "Accra".to_string(),
        state: None,
        zip: None,
        country: None,
        is_default,
    }
}

// ============================================================================
// Orders: status machine
// ============================================================================

#[tokio::test]
async fn create_starts_pending_on_both_machines() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.total, Money::from_pesewas(25_190));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn create_without_recipient_is_rejected() {
    let store = InMemoryOrderStore::new();
    let mut input = new_order(None);
    input.guest = None;

    let err = store.create(input).await.unwrap_err();
    assert_eq!(err, StoreError::NotPermitted);
    assert!(store.is_empty());
}

#[tokio::test]
async fn fulfilment_walks_the_happy_path() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        let updated = store.update_status(order.id, status).await.unwrap();
        assert_eq!(updated.status, status);
    }
}

#[tokio::test]
async fn fulfilment_rejects_skipped_steps() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();

    let err = store
        .update_status(order.id, OrderStatus::OutForDelivery)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::InvalidTransition {
            from: "PENDING".to_string(),
            to: "OUT_FOR_DELIVERY".to_string(),
        }
    );

    // The failed attempt must not have moved anything.
    let stored = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn terminal_orders_refuse_further_transitions() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();
    store
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let err = store
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }));
}

#[tokio::test]
async fn update_status_unknown_order_is_not_found() {
    let store = InMemoryOrderStore::new();
    let err = store
        .update_status(OrderId::new(), OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound);
}

// ============================================================================
// Orders: payment settlement
// ============================================================================

#[tokio::test]
async fn paid_confirms_a_pending_order() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();

    let updated = store
        .update_payment_status(order.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
    assert_eq!(updated.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn paid_leaves_an_already_confirmed_order_alone() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();
    store
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    store
        .update_status(order.id, OrderStatus::Preparing)
        .await
        .unwrap();

    let updated = store
        .update_payment_status(order.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
    assert_eq!(updated.status, OrderStatus::Preparing);
}

#[tokio::test]
async fn failed_settlement_keeps_the_order_pending() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();

    let updated = store
        .update_payment_status(order.id, PaymentStatus::Failed)
        .await
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Failed);
    assert_eq!(updated.status, OrderStatus::Pending);
}

#[tokio::test]
async fn payment_redelivery_is_a_no_op() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();
    store
        .update_payment_status(order.id, PaymentStatus::Paid)
        .await
        .unwrap();

    // The same outcome again: fine, callbacks retry.
    let again = store
        .update_payment_status(order.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(again.payment_status, PaymentStatus::Paid);

    // A conflicting outcome: refused.
    let err = store
        .update_payment_status(order.id, PaymentStatus::Failed)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::InvalidTransition {
            from: "PAID".to_string(),
            to: "FAILED".to_string(),
        }
    );
}

// ============================================================================
// Orders: cancellation and linking
// ============================================================================

#[tokio::test]
async fn owner_can_cancel_pending_and_confirmed() {
    let store = InMemoryOrderStore::new();
    let user = UserId::new();

    let pending = store.create(new_order(Some(user))).await.unwrap();
    let cancelled = store.cancel(pending.id, user).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let confirmed = store.create(new_order(Some(user))).await.unwrap();
    store
        .update_status(confirmed.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    let cancelled = store.cancel(confirmed.id, user).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn cancel_hides_foreign_orders() {
    let store = InMemoryOrderStore::new();
    let owner = UserId::new();
    let order = store.create(new_order(Some(owner))).await.unwrap();

    let err = store.cancel(order.id, UserId::new()).await.unwrap_err();
    assert_eq!(err, StoreError::NotFound);
}

#[tokio::test]
async fn cancel_stops_once_preparation_starts() {
    let store = InMemoryOrderStore::new();
    let user = UserId::new();
    let order = store.create(new_order(Some(user))).await.unwrap();
    store
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    store
        .update_status(order.id, OrderStatus::Preparing)
        .await
        .unwrap();

    let err = store.cancel(order.id, user).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::InvalidTransition {
            from: "PREPARING".to_string(),
            to: "CANCELLED".to_string(),
        }
    );

    // Staff tooling may still cancel through the machine.
    let updated = store
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn linking_claims_a_guest_order_exactly_once() {
    let store = InMemoryOrderStore::new();
    let order = store.create(new_order(None)).await.unwrap();
    assert_eq!(order.user_id, None);

    let user = UserId::new();
    let linked = store.link_to_user(order.id, user).await.unwrap();
    assert_eq!(linked.user_id, Some(user));

    // Linked orders cannot be claimed again, not even by the same user.
    let err = store.link_to_user(order.id, user).await.unwrap_err();
    assert_eq!(err, StoreError::AlreadyLinked);
    let err = store.link_to_user(order.id, UserId::new()).await.unwrap_err();
    assert_eq!(err, StoreError::AlreadyLinked);

    // The guest contact stays on the order after linking.
    let stored = store.get(order.id).await.unwrap().unwrap();
    assert!(stored.guest.is_some());
}

#[tokio::test]
async fn list_for_user_is_newest_first_and_scoped() {
    let store = InMemoryOrderStore::new();
    let user = UserId::new();

    let first = store.create(new_order(Some(user))).await.unwrap();
    let second = store.create(new_order(Some(user))).await.unwrap();
    store.create(new_order(Some(UserId::new()))).await.unwrap();
    store.create(new_order(None)).await.unwrap();

    let orders = store.list_for_user(user).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, second.id);
    assert_eq!(orders[1].id, first.id);
}

// ============================================================================
// Addresses
// ============================================================================

#[tokio::test]
async fn first_address_becomes_the_default() {
    let store = InMemoryAddressStore::new();
    let user = UserId::new();

    let home = store.create(user, address("Home", false)).await.unwrap();
    assert!(home.is_default);
    assert_eq!(home.country, DEFAULT_COUNTRY);

    let default = store.default_for(user).await.unwrap().unwrap();
    assert_eq!(default.id, home.id);
}

#[tokio::test]
async fn a_new_default_steals_the_flag() {
    let store = InMemoryAddressStore::new();
    let user = UserId::new();

    let home = store.create(user, address("Home", false)).await.unwrap();
    let office = store.create(user, address("Office", true)).await.unwrap();
    assert!(office.is_default);

    let rows = store.list(user).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, office.id); // default sorts first
    assert!(!rows[1].is_default);
    assert_eq!(rows[1].id, home.id);
}

#[tokio::test]
async fn update_can_move_or_drop_the_default() {
    let store = InMemoryAddressStore::new();
    let user = UserId::new();

    let home = store.create(user, address("Home", false)).await.unwrap();
    let office = store.create(user, address("Office", false)).await.unwrap();
    assert!(!office.is_default);

    let office = store
        .update(user, office.id, address("Office", true))
        .await
        .unwrap();
    assert!(office.is_default);
    assert!(!store.get(user, home.id).await.unwrap().unwrap().is_default);

    // Unsetting the only default leaves the user with none.
    store
        .update(user, office.id, address("Office", false))
        .await
        .unwrap();
    assert!(store.default_for(user).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_the_default_promotes_nothing() {
    let store = InMemoryAddressStore::new();
    let user = UserId::new();

    let home = store.create(user, address("Home", true)).await.unwrap();
    store.create(user, address("Office", false)).await.unwrap();

    store.delete(user, home.id).await.unwrap();
    assert!(store.default_for(user).await.unwrap().is_none());
    assert_eq!(store.list(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn addresses_are_scoped_by_owner() {
    let store = InMemoryAddressStore::new();
    let owner = UserId::new();
    let other = UserId::new();

    let home = store.create(owner, address("Home", true)).await.unwrap();

    assert!(store.get(other, home.id).await.unwrap().is_none());
    assert!(store.list(other).await.unwrap().is_empty());
    assert_eq!(
        store
            .update(other, home.id, address("Stolen", true))
            .await
            .unwrap_err(),
        StoreError::NotFound
    );
    assert_eq!(
        store.delete(other, home.id).await.unwrap_err(),
        StoreError::NotFound
    );
    assert_eq!(
        store.delete(owner, AddressId::new()).await.unwrap_err(),
        StoreError::NotFound
    );

    // Another user's defaults never interfere.
    let other_home = store.create(other, address("Home", true)).await.unwrap();
    assert!(other_home.is_default);
    assert!(store.get(owner, home.id).await.unwrap().unwrap().is_default);
}

// ============================================================================
// Payment methods
// ============================================================================

#[tokio::test]
async fn first_payment_method_becomes_the_default() {
    let store = InMemoryPaymentMethodStore::new();
    let user = UserId::new();

    let input = PaymentMethodInput::mobile_money("0241234567", false).unwrap();
    let method = store.create(user, input).await.unwrap();
    assert!(method.is_default);
    assert_eq!(method.provider, "MTN Mobile Money");
    assert_eq!(method.last4, "4567");
}

#[tokio::test]
async fn a_new_default_method_steals_the_flag() {
    let store = InMemoryPaymentMethodStore::new();
    let user = UserId::new();

    let momo = store
        .create(
            user,
            PaymentMethodInput::mobile_money("0241234567", false).unwrap(),
        )
        .await
        .unwrap();
    let card = store
        .create(
            user,
            PaymentMethodInput::card("4242 4242 4242 4242", None, None, true).unwrap(),
        )
        .await
        .unwrap();
    assert!(card.is_default);

    let rows = store.list(user).await.unwrap();
    assert_eq!(rows[0].id, card.id);
    assert!(!rows[1].is_default);
    assert_eq!(rows[1].id, momo.id);
}

#[tokio::test]
async fn method_update_moves_the_default_and_renames_the_holder() {
    let store = InMemoryPaymentMethodStore::new();
    let user = UserId::new();

    let momo = store
        .create(
            user,
            PaymentMethodInput::mobile_money("0241234567", false).unwrap(),
        )
        .await
        .unwrap();
    let card = store
        .create(
            user,
            PaymentMethodInput::card("4242 4242 4242 4242", Some("Ama".into()), None, false)
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!card.is_default);

    let card = store
        .update(
            user,
            card.id,
            PaymentMethodUpdate {
                is_default: Some(true),
                holder_name: Some("Ama Mensah".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(card.is_default);
    assert_eq!(card.holder_name.as_deref(), Some("Ama Mensah"));

    let rows = store.list(user).await.unwrap();
    assert!(!rows.iter().any(|m| m.id == momo.id && m.is_default));
}

#[tokio::test]
async fn methods_are_scoped_by_owner() {
    let store = InMemoryPaymentMethodStore::new();
    let owner = UserId::new();
    let other = UserId::new();

    let momo = store
        .create(
            owner,
            PaymentMethodInput::mobile_money("0241234567", true).unwrap(),
        )
        .await
        .unwrap();

    assert!(store.list(other).await.unwrap().is_empty());
    assert_eq!(
        store
            .update(other, momo.id, PaymentMethodUpdate::default())
            .await
            .unwrap_err(),
        StoreError::NotFound
    );
    assert_eq!(
        store.delete(other, momo.id).await.unwrap_err(),
        StoreError::NotFound
    );
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn identity_resolves_registered_tokens_only() {
    let identity = MockIdentity::new();
    let user = fixtures::test_user();
    identity.insert("session_abc", user.clone());

    let resolved = identity.resolve("session_abc").await.unwrap();
    assert_eq!(resolved, Some(user));

    let missing = identity.resolve("session_expired").await.unwrap();
    assert_eq!(missing, None);
}
