//! Signed cart cookie codec.
//!
//! The cart never touches the database; it rides in a browser cookie as a
//! base64url JSON envelope plus a SHA-256 tag keyed by a server secret.
//! Decoding is total: tampered, truncated, stale, oversized, or otherwise
//! unreadable cookies come back as an empty cart rather than an error, so a
//! bad cookie can never break a request.

use crate::cart::Cart;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Name of the cart cookie.
pub const CART_COOKIE_NAME: &str = "crust_cart";

/// Hard ceiling on the encoded cookie, just under the common 4 KiB
/// browser limit.
pub const MAX_COOKIE_BYTES: usize = 4096;

/// How long an issued cart stays valid.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;

const ENVELOPE_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope {
    v: u8,
    issued_at: i64,
    cart: Cart,
}

/// Encoder/decoder for the signed cart cookie.
#[derive(Clone)]
pub struct CartCookieCodec {
    secret: Vec<u8>,
    max_age: Duration,
    max_bytes: usize,
}

impl CartCookieCodec {
    /// Creates a codec with the default age and size limits.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
            max_bytes: MAX_COOKIE_BYTES,
        }
    }

    /// Overrides how long issued carts stay valid.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Overrides the encoded size ceiling.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// How long issued carts stay valid. The cookie's `Max-Age` attribute
    /// should match this, so the browser and the codec expire together.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Encodes and signs a cart, stamped with the current time.
    #[must_use]
    pub fn encode(&self, cart: &Cart) -> String {
        self.encode_at(cart, Utc::now())
    }

    fn encode_at(&self, cart: &Cart, issued_at: DateTime<Utc>) -> String {
        let envelope = Envelope {
            v: ENVELOPE_VERSION,
            issued_at: issued_at.timestamp(),
            cart: cart.clone(),
        };
        // Serialization of plain data cannot fail; an empty string decodes
        // to an empty cart either way.
        let Ok(json) = serde_json::to_vec(&envelope) else {
            return String::new();
        };
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json);
        let tag = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.tag_for(&payload));
        format!("{payload}.{tag}")
    }

    /// Decodes a cookie value into a cart.
    ///
    /// Total: any failure yields an empty cart. A decoded cart is
    /// additionally re-validated against the cart invariants before it is
    /// trusted.
    #[must_use]
    pub fn decode(&self, raw: &str) -> Cart {
        self.try_decode(raw).unwrap_or_default()
    }

    fn try_decode(&self, raw: &str) -> Option<Cart> {
        if raw.len() > self.max_bytes {
            return None;
        }
        let (payload, tag) = raw.split_once('.')?;

        let provided = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(tag)
            .ok()?;
        let expected = self.tag_for(payload);
        if !constant_time_eq::constant_time_eq(&expected, &provided) {
            return None;
        }

        let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .ok()?;
        let envelope: Envelope = serde_json::from_slice(&json).ok()?;
        if envelope.v != ENVELOPE_VERSION {
            return None;
        }

        let issued_at = DateTime::<Utc>::from_timestamp(envelope.issued_at, 0)?;
        if Utc::now().signed_duration_since(issued_at) > self.max_age {
            return None;
        }

        envelope.cart.is_well_formed().then_some(envelope.cart)
    }

    fn tag_for(&self, payload: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(payload.as_bytes());
        hasher.finalize().into()
    }
}
