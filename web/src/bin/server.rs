//! Crust storefront HTTP server.
//!
//! Boots the Postgres-backed stores, the mobile money gateway client, and
//! the Axum router, all configured from the environment.

use crust_core::{
    AddressStore, CheckoutService, Identity, OrderStore, PaymentGateway, PaymentMethodStore,
    RateLimiter,
};
use crust_gateway::HttpMomoGateway;
use crust_postgres::{
    PostgresAddressStore, PostgresIdentity, PostgresOrderStore, PostgresPaymentMethodStore,
};
use crust_web::{build_router, AppState, Config, InMemoryRateLimiter};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A .env file is optional; real environment variables win
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crust_web=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Crust storefront server");

    // Load configuration
    let config = Config::from_env();
    info!(
        address = %config.bind_addr(),
        gateway = %config.gateway.base_url,
        "Configuration loaded"
    );
    if config.uses_dev_secrets() {
        warn!("running with development secrets, set CART_COOKIE_SECRET and PAYMENT_CALLBACK_TOKEN");
    }

    // Connect to PostgreSQL and apply migrations
    info!("Connecting to PostgreSQL...");
    let pool =
        crust_postgres::connect(&config.database.url, config.database.max_connections).await?;
    crust_postgres::run_migrations(&pool).await?;
    info!("Database ready");

    // Wire the stores and collaborators
    let orders: Arc<dyn OrderStore> = Arc::new(PostgresOrderStore::new(pool.clone()));
    let addresses: Arc<dyn AddressStore> = Arc::new(PostgresAddressStore::new(pool.clone()));
    let payment_methods: Arc<dyn PaymentMethodStore> =
        Arc::new(PostgresPaymentMethodStore::new(pool.clone()));
    let identity: Arc<dyn Identity> = Arc::new(PostgresIdentity::new(pool));
    let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpMomoGateway::new(
        config.gateway.base_url.clone(),
        config.gateway.api_key.clone(),
        config.gateway_timeout(),
    )?);
    let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new());

    let checkout = Arc::new(CheckoutService::new(
        orders.clone(),
        addresses.clone(),
        payment_methods.clone(),
        gateway.clone(),
        config.pricing(),
        config.gateway.callback_url.clone(),
    ));

    // Build application state
    let state = AppState {
        orders,
        addresses,
        payment_methods,
        identity,
        gateway,
        limiter,
        checkout,
        cart_codec: config.cart_codec(),
        callback_token: config.gateway.callback_token.clone(),
        checkout_limit: config.checkout_limit(),
    };

    // Build router
    let app = build_router(state);

    // Create TCP listener
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            // Without a handler the signal would kill us anyway; stay up
            warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
