//! # Crust Gateway
//!
//! HTTP client for the mobile-money aggregator behind Crust's push
//! payments. Implements the [`PaymentGateway`](crust_core::gateway::PaymentGateway)
//! trait from `crust-core`, so checkout code never knows whether it is
//! talking to this client or to a test double.
//!
//! The aggregator API is a small JSON surface: `POST /v1/charges` starts
//! a charge (the customer approves on their handset, the outcome arrives
//! on our callback), `GET /v1/charges/{reference}` reads its state.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod client;

// Re-export main types for convenience
pub use client::HttpMomoGateway;
