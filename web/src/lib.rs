//! # Crust Web
//!
//! Axum HTTP layer for the Crust pizza storefront.
//!
//! This crate wires the domain logic in `crust-core` to the outside
//! world: JSON endpoints, the signed cart cookie, bearer-token identity,
//! the payment-provider webhook, and checkout rate limiting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            HTTP edge (Axum)             │  ← JSON, cookies, CORS
//! │  - extractors: cart, user, client ip    │  ← rate limiting
//! │  - handlers: cart, checkout, orders,    │  ← request-id tracing
//! │    payments, addresses, payment methods │
//! ├─────────────────────────────────────────┤
//! │         Domain (crust-core)             │
//! │  - Cart and cookie codec                │  ← Testable at memory speed
//! │  - CheckoutService orchestration        │  ← No HTTP, no SQL
//! │  - Store / gateway / identity traits    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP request** arrives at an Axum handler
//! 2. **Extractors** rebuild the cart from its signed cookie and resolve
//!    the caller from the `Authorization` header
//! 3. **Handlers** call into `crust-core` services and stores
//! 4. **`AppError`** maps domain failures to status codes and a JSON body
//! 5. **Cart mutations** re-sign the cart and set a fresh cookie
//!
//! Handlers never see raw cookies or tokens; the extractors in
//! [`extractors`] are the only place those are parsed.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use extractors::{ClientIp, MaybeUser, SessionCart, SessionUser};
pub use middleware::{RequestId, REQUEST_ID_HEADER};
pub use rate_limit::InMemoryRateLimiter;
pub use router::build_router;
pub use state::{AppState, CheckoutLimit};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
