//! Service configuration from environment variables.
//!
//! Everything has a development default, so `cargo run` works with no
//! environment at all; production deployments override the secrets and
//! endpoints. Missing or unparseable values fall back to the default
//! rather than failing startup.

use crate::state::CheckoutLimit;
use crust_core::checkout::{
    PricingConfig, DEFAULT_DELIVERY_FEE_PESEWAS, DEFAULT_TAX_RATE_BPS,
};
use crust_core::cookie::{CartCookieCodec, DEFAULT_MAX_AGE_DAYS};
use std::env;
use std::time::Duration;

/// Placeholder secret that must be overridden outside development.
const DEV_SECRET: &str = "dev-secret-change-in-production";

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Postgres settings
    pub database: DatabaseConfig,
    /// Cart cookie settings
    pub cart: CartConfig,
    /// Delivery fee and tax knobs
    pub pricing: PricingSettings,
    /// Mobile-money gateway settings
    pub gateway: GatewayConfig,
    /// Checkout rate-limit settings
    pub rate_limit: RateLimitConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (`HOST`)
    pub host: String,
    /// Port to bind (`PORT`)
    pub port: u16,
}

/// Postgres settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string (`DATABASE_URL`)
    pub url: String,
    /// Pool size (`DATABASE_MAX_CONNECTIONS`)
    pub max_connections: u32,
}

/// Cart cookie settings.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Signing secret (`CART_COOKIE_SECRET`)
    pub secret: String,
    /// Days an issued cart stays valid (`CART_MAX_AGE_DAYS`)
    pub max_age_days: i64,
}

/// Delivery fee and tax knobs.
#[derive(Debug, Clone)]
pub struct PricingSettings {
    /// Flat delivery fee in pesewas (`DELIVERY_FEE_PESEWAS`)
    pub delivery_fee_pesewas: u64,
    /// Tax rate in basis points (`TAX_RATE_BPS`)
    pub tax_rate_bps: u32,
}

/// Mobile-money gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Provider API base URL (`MOMO_BASE_URL`)
    pub base_url: String,
    /// Provider API key (`MOMO_API_KEY`)
    pub api_key: String,
    /// Request timeout in seconds (`MOMO_TIMEOUT_SECS`)
    pub timeout_secs: u64,
    /// Public URL the provider posts payment outcomes to
    /// (`PAYMENT_CALLBACK_URL`)
    pub callback_url: String,
    /// Shared secret the provider must echo on callbacks
    /// (`PAYMENT_CALLBACK_TOKEN`)
    pub callback_token: String,
}

/// Checkout rate-limit settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Allowed checkout attempts per window (`CHECKOUT_RATE_LIMIT_REQUESTS`)
    pub checkout_max_requests: u32,
    /// Window length in seconds (`CHECKOUT_RATE_LIMIT_WINDOW_SECS`)
    pub checkout_window_secs: u64,
}

impl Config {
    /// Loads configuration from the environment, applying defaults for
    /// anything unset.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost:5432/crust".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            },
            cart: CartConfig {
                secret: env::var("CART_COOKIE_SECRET").unwrap_or_else(|_| DEV_SECRET.to_string()),
                max_age_days: env::var("CART_MAX_AGE_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_AGE_DAYS),
            },
            pricing: PricingSettings {
                delivery_fee_pesewas: env::var("DELIVERY_FEE_PESEWAS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_DELIVERY_FEE_PESEWAS),
                tax_rate_bps: env::var("TAX_RATE_BPS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TAX_RATE_BPS),
            },
            gateway: GatewayConfig {
                base_url: env::var("MOMO_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:9090".to_string()),
                api_key: env::var("MOMO_API_KEY").unwrap_or_else(|_| "dev-api-key".to_string()),
                timeout_secs: env::var("MOMO_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
                callback_url: env::var("PAYMENT_CALLBACK_URL").unwrap_or_else(|_| {
                    "http://localhost:8080/api/payments/callback".to_string()
                }),
                callback_token: env::var("PAYMENT_CALLBACK_TOKEN")
                    .unwrap_or_else(|_| "dev-callback-token".to_string()),
            },
            rate_limit: RateLimitConfig {
                checkout_max_requests: env::var("CHECKOUT_RATE_LIMIT_REQUESTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
                checkout_window_secs: env::var("CHECKOUT_RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            },
        }
    }

    /// Socket address string to bind the listener to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Pricing knobs as the checkout service expects them.
    #[must_use]
    pub const fn pricing(&self) -> PricingConfig {
        PricingConfig {
            delivery_fee: crust_core::types::Money::from_pesewas(self.pricing.delivery_fee_pesewas),
            tax_rate_bps: self.pricing.tax_rate_bps,
        }
    }

    /// Cookie codec configured with this secret and age limit.
    #[must_use]
    pub fn cart_codec(&self) -> CartCookieCodec {
        CartCookieCodec::new(self.cart.secret.as_bytes())
            .with_max_age(chrono::Duration::days(self.cart.max_age_days))
    }

    /// Checkout rate-limit parameters.
    #[must_use]
    pub const fn checkout_limit(&self) -> CheckoutLimit {
        CheckoutLimit {
            max_requests: self.rate_limit.checkout_max_requests,
            window: Duration::from_secs(self.rate_limit.checkout_window_secs),
        }
    }

    /// Gateway request timeout.
    #[must_use]
    pub const fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.timeout_secs)
    }

    /// Whether any secret still carries its development default.
    #[must_use]
    pub fn uses_dev_secrets(&self) -> bool {
        self.cart.secret == DEV_SECRET || self.gateway.callback_token == "dev-callback-token"
    }
}
