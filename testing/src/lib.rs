//! # Crust Testing
//!
//! In-memory stores and test doubles for the Crust storefront.
//!
//! This crate provides:
//! - `HashMap`-backed implementations of every `crust-core` store trait
//! - A scriptable payment gateway double that records its traffic
//! - A token-map identity resolver
//! - Canned carts, users, and contacts
//!
//! Everything here is deterministic and runs at memory speed, so checkout
//! orchestration and web handlers can be tested without Postgres or a
//! payment provider.
//!
//! ## Example
//!
//! ```
//! use crust_core::checkout::{CheckoutRequest, CheckoutService, PaymentSelection, PricingConfig};
//! use crust_testing::{fixtures, InMemoryAddressStore, InMemoryOrderStore,
//!     InMemoryPaymentMethodStore, RecordingGateway};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orders = InMemoryOrderStore::new();
//! let service = CheckoutService::new(
//!     Arc::new(orders.clone()),
//!     Arc::new(InMemoryAddressStore::new()),
//!     Arc::new(InMemoryPaymentMethodStore::new()),
//!     Arc::new(RecordingGateway::new()),
//!     PricingConfig::default(),
//!     "http://localhost:3000/api/payments/callback",
//! );
//!
//! let request = CheckoutRequest {
//!     payment: PaymentSelection::CashOnDelivery,
//!     address_id: None,
//!     contact: Some(fixtures::guest_contact()),
//! };
//! let outcome = service.process(&fixtures::sample_cart(), request, None).await?;
//! assert_eq!(outcome.total.pesewas(), 25_190);
//! assert_eq!(orders.len(), 1);
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod fixtures;
pub mod gateway;
pub mod memory;

// Re-export main types for convenience
pub use gateway::{GatewayScript, RecordingGateway};
pub use memory::{
    InMemoryAddressStore, InMemoryOrderStore, InMemoryPaymentMethodStore, MockIdentity,
};
