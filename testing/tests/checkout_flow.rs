//! End-to-end checkout orchestration through the in-memory doubles.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use crust_core::checkout::{
    CheckoutError, CheckoutRequest, CheckoutService, PaymentSelection, PricingConfig,
};
use crust_core::order::{OrderStatus, PaymentStatus};
use crust_core::store::{AddressInput, AddressStore, OrderStore, PaymentMethodStore};
use crust_core::types::{AddressId, GuestContact, Money};
use crust_testing::{
    fixtures, GatewayScript, InMemoryAddressStore, InMemoryOrderStore, InMemoryPaymentMethodStore,
    RecordingGateway,
};
use std::sync::Arc;

struct Harness {
    orders: InMemoryOrderStore,
    addresses: InMemoryAddressStore,
    methods: InMemoryPaymentMethodStore,
    gateway: RecordingGateway,
    service: CheckoutService,
}

fn harness() -> Harness {
    let orders = InMemoryOrderStore::new();
    let addresses = InMemoryAddressStore::new();
    let methods = InMemoryPaymentMethodStore::new();
    let gateway = RecordingGateway::new();
    let service = CheckoutService::new(
        Arc::new(orders.clone()),
        Arc::new(addresses.clone()),
        Arc::new(methods.clone()),
        Arc::new(gateway.clone()),
        PricingConfig::default(),
        "http://localhost:3000/api/payments/callback",
    );
    Harness {
        orders,
        addresses,
        methods,
        gateway,
        service,
    }
}

fn cod(contact: Option<GuestContact>) -> CheckoutRequest {
    CheckoutRequest {
        payment: PaymentSelection::CashOnDelivery,
        address_id: None,
        contact,
    }
}

fn momo(phone: &str, contact: Option<GuestContact>) -> CheckoutRequest {
    CheckoutRequest {
        payment: PaymentSelection::MobileMoney {
            phone: phone.to_string(),
        },
        address_id: None,
        contact,
    }
}

fn card() -> CheckoutRequest {
    CheckoutRequest {
        payment: PaymentSelection::Card {
            number: "4242 4242 4242 4242".to_string(),
            holder: "Ama Mensah".to_string(),
            expiry: "09/27".to_string(),
            cvc: "123".to_string(),
        },
        address_id: None,
        contact: None,
    }
}

fn home_address(is_default: bool) -> AddressInput {
    AddressInput {
        label: "Home".to_string(),
        street: "12 Oxford Street".to_string(),
        city: "Accra".to_string(),
        state: None,
        zip: None,
        country: None,
        is_default,
    }
}

// ============================================================================
// Gates
// ============================================================================

#[tokio::test]
async fn guest_cod_checkout_creates_a_pending_order() {
    let h = harness();
    let cart = fixtures::sample_cart();

    let outcome = h
        .service
        .process(&cart, cod(Some(fixtures::guest_contact())), None)
        .await
        .unwrap();

    // 23,000 subtotal + 1,500 delivery + 3% tax.
    assert_eq!(outcome.total, Money::from_pesewas(25_190));
    assert_eq!(outcome.guest_contact, Some(fixtures::guest_contact()));

    let order = h.orders.get(outcome.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.user_id, None);
    assert_eq!(order.address_id, None);
    assert_eq!(order.subtotal, Money::from_pesewas(23_000));
    assert_eq!(order.tax, Money::from_pesewas(690));
    assert_eq!(order.items.len(), 2);

    // Checkout never touches the cart; clearing the cookie is the
    // caller's job.
    assert_eq!(cart.len(), 2);
    assert!(h.gateway.is_empty());
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let h = harness();

    let err = h
        .service
        .process(
            &crust_core::cart::Cart::new(),
            cod(Some(fixtures::guest_contact())),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err, CheckoutError::EmptyCart);
    assert!(h.orders.is_empty());
}

#[tokio::test]
async fn payment_validation_runs_before_the_cart_check() {
    let h = harness();
    let bad_card = CheckoutRequest {
        payment: PaymentSelection::Card {
            number: "4242".to_string(),
            holder: String::new(),
            expiry: "bad".to_string(),
            cvc: "1".to_string(),
        },
        address_id: None,
        contact: None,
    };

    // Empty cart AND bad payment: the payment errors win.
    let err = h
        .service
        .process(&crust_core::cart::Cart::new(), bad_card, None)
        .await
        .unwrap_err();
    let CheckoutError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.errors().iter().any(|e| e.field == "number"));
    assert!(h.orders.is_empty());
}

#[tokio::test]
async fn guest_without_contact_collects_field_errors() {
    let h = harness();

    let err = h
        .service
        .process(&fixtures::sample_cart(), cod(None), None)
        .await
        .unwrap_err();
    let CheckoutError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "phone", "address"]);
    assert!(h.orders.is_empty());
}

// ============================================================================
// Payment branches
// ============================================================================

#[tokio::test]
async fn card_checkout_settles_immediately() {
    let h = harness();
    let user = fixtures::test_user();

    let outcome = h
        .service
        .process(&fixtures::sample_cart(), card(), Some(&user))
        .await
        .unwrap();

    let order = h.orders.get(outcome.order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.user_id, Some(user.id));
    assert_eq!(outcome.guest_contact, None);
    assert!(h.gateway.is_empty());
}

#[tokio::test]
async fn momo_checkout_pushes_to_the_gateway() {
    let h = harness();

    let outcome = h
        .service
        .process(
            &fixtures::sample_cart(),
            momo("0201234567", Some(fixtures::guest_contact())),
            None,
        )
        .await
        .unwrap();

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].reference, outcome.order_id.to_string());
    assert_eq!(requests[0].amount, Money::from_pesewas(25_190));
    assert_eq!(requests[0].msisdn, "233201234567");
    assert_eq!(requests[0].customer_name, "Kofi Boateng");
    assert_eq!(
        requests[0].callback_url,
        "http://localhost:3000/api/payments/callback"
    );

    // Settlement arrives later through the callback.
    let order = h.orders.get(outcome.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn gateway_failures_do_not_lose_the_order() {
    let h = harness();
    h.gateway
        .script(GatewayScript::Unreachable("connection refused".to_string()));

    let outcome = h
        .service
        .process(
            &fixtures::sample_cart(),
            momo("0201234567", Some(fixtures::guest_contact())),
            None,
        )
        .await
        .unwrap();
    let order = h.orders.get(outcome.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    h.gateway
        .script(GatewayScript::Reject("insufficient funds".to_string()));
    let outcome = h
        .service
        .process(
            &fixtures::sample_cart(),
            momo("0201234567", Some(fixtures::guest_contact())),
            None,
        )
        .await
        .unwrap();
    assert!(h.orders.get(outcome.order_id).await.unwrap().is_some());
    assert_eq!(h.gateway.requests().len(), 2);
}

// ============================================================================
// Implicit wallet save
// ============================================================================

#[tokio::test]
async fn momo_wallet_is_saved_once_for_signed_in_buyers() {
    let h = harness();
    let user = fixtures::test_user();

    h.service
        .process(
            &fixtures::sample_cart(),
            momo("0541234567", None),
            Some(&user),
        )
        .await
        .unwrap();

    let methods = h.methods.list(user.id).await.unwrap();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].provider, "MTN Mobile Money");
    assert_eq!(methods[0].phone.as_deref(), Some("0541234567"));
    assert!(methods[0].is_default); // first method

    // Same wallet again, in international form: no duplicate.
    h.service
        .process(
            &fixtures::sample_cart(),
            momo("+233541234567", None),
            Some(&user),
        )
        .await
        .unwrap();
    assert_eq!(h.methods.list(user.id).await.unwrap().len(), 1);

    // A different wallet is saved, but the default stays put.
    h.service
        .process(
            &fixtures::sample_cart(),
            momo("0261234567", None),
            Some(&user),
        )
        .await
        .unwrap();
    let methods = h.methods.list(user.id).await.unwrap();
    assert_eq!(methods.len(), 2);
    let newcomer = methods
        .iter()
        .find(|m| m.phone.as_deref() == Some("0261234567"))
        .unwrap();
    assert!(!newcomer.is_default);
    assert_eq!(newcomer.provider, "AT Money");
}

#[tokio::test]
async fn guest_momo_checkout_saves_nothing() {
    let h = harness();

    h.service
        .process(
            &fixtures::sample_cart(),
            momo("0541234567", Some(fixtures::guest_contact())),
            None,
        )
        .await
        .unwrap();
    assert!(h.methods.is_empty());
}

// ============================================================================
// Address resolution
// ============================================================================

#[tokio::test]
async fn explicit_address_is_resolved_for_the_buyer() {
    let h = harness();
    let user = fixtures::test_user();
    let home = h
        .addresses
        .create(user.id, home_address(false))
        .await
        .unwrap();

    let request = CheckoutRequest {
        address_id: Some(home.id),
        ..cod(None)
    };
    let outcome = h
        .service
        .process(&fixtures::sample_cart(), request, Some(&user))
        .await
        .unwrap();

    let order = h.orders.get(outcome.order_id).await.unwrap().unwrap();
    assert_eq!(order.address_id, Some(home.id));
}

#[tokio::test]
async fn foreign_or_unknown_address_ids_fail_validation() {
    let h = harness();
    let user = fixtures::test_user();
    let stranger = fixtures::test_user();
    let strangers_home = h
        .addresses
        .create(stranger.id, home_address(true))
        .await
        .unwrap();

    for address_id in [strangers_home.id, AddressId::new()] {
        let request = CheckoutRequest {
            address_id: Some(address_id),
            ..cod(None)
        };
        let err = h
            .service
            .process(&fixtures::sample_cart(), request, Some(&user))
            .await
            .unwrap_err();
        let CheckoutError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.errors()[0].field, "address_id");
    }
    assert!(h.orders.is_empty());
}

#[tokio::test]
async fn default_address_fills_in_when_none_is_given() {
    let h = harness();
    let user = fixtures::test_user();
    let home = h
        .addresses
        .create(user.id, home_address(true))
        .await
        .unwrap();

    let outcome = h
        .service
        .process(&fixtures::sample_cart(), cod(None), Some(&user))
        .await
        .unwrap();
    let order = h.orders.get(outcome.order_id).await.unwrap().unwrap();
    assert_eq!(order.address_id, Some(home.id));
}

#[tokio::test]
async fn buyers_without_addresses_check_out_fine() {
    let h = harness();
    let user = fixtures::test_user();

    let outcome = h
        .service
        .process(&fixtures::sample_cart(), cod(None), Some(&user))
        .await
        .unwrap();
    let order = h.orders.get(outcome.order_id).await.unwrap().unwrap();
    assert_eq!(order.address_id, None);
}

#[tokio::test]
async fn guests_never_resolve_saved_addresses() {
    let h = harness();
    let someone = fixtures::test_user();
    let their_home = h
        .addresses
        .create(someone.id, home_address(true))
        .await
        .unwrap();

    // A guest quoting a real address id still delivers to the contact
    // address; the id is ignored rather than rejected.
    let request = CheckoutRequest {
        address_id: Some(their_home.id),
        contact: Some(fixtures::guest_contact()),
        ..cod(None)
    };
    let outcome = h
        .service
        .process(&fixtures::sample_cart(), request, None)
        .await
        .unwrap();
    let order = h.orders.get(outcome.order_id).await.unwrap().unwrap();
    assert_eq!(order.address_id, None);
    assert!(order.guest.is_some());
}
