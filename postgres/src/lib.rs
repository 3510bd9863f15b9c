//! # Crust Postgres
//!
//! PostgreSQL persistence for the Crust storefront: sqlx implementations
//! of the store traits from `crust-core`, the embedded schema migrations,
//! and a session-table [`Identity`](crust_core::identity::Identity)
//! resolver.
//!
//! All stores share one [`PgPool`]. State-changing queries are either
//! single guarded statements (status transitions, guest-order linking) or
//! short transactions (default-flag writes), so the store invariants hold
//! under concurrent requests; the schema backs the single-default rule
//! with partial unique indexes.
//!
//! ```ignore
//! let pool = crust_postgres::connect(&database_url, 5).await?;
//! crust_postgres::run_migrations(&pool).await?;
//! let orders = PostgresOrderStore::new(pool.clone());
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod addresses;
pub mod identity;
pub mod orders;
pub mod payment_methods;

// Re-export main types for convenience
pub use addresses::PostgresAddressStore;
pub use identity::PostgresIdentity;
pub use orders::PostgresOrderStore;
pub use payment_methods::PostgresPaymentMethodStore;
pub use sqlx::PgPool;

use crust_core::store::StoreError;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// How long a request waits for a pool connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a connection pool against `database_url`.
///
/// # Errors
///
/// [`StoreError::Database`] when the URL is malformed or the server
/// cannot be reached.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to connect to PostgreSQL: {e}")))
}

/// Applies the migrations embedded from `migrations/`.
///
/// Already-applied migrations are skipped, so this runs on every boot.
///
/// # Errors
///
/// [`StoreError::Database`] when a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to run migrations: {e}")))
}
