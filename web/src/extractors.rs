//! Custom Axum extractors.
//!
//! This module contains the extractors handlers use to get at the session:
//! - `SessionCart`: the cart decoded from the signed cookie, never failing
//! - `SessionUser`: the signed-in user, rejecting anonymous requests
//! - `MaybeUser`: the signed-in user if any, admitting guests
//! - `ClientIp`: client IP address from proxy headers
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     SessionCart(cart): SessionCart,
//!     MaybeUser(user): MaybeUser,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(items = cart.len(), authenticated = user.is_some(), "Processing request");
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use crust_core::cart::Cart;
use crust_core::cookie::CART_COOKIE_NAME;
use crust_core::types::CurrentUser;
use std::net::{IpAddr, Ipv4Addr};

/// The session cart, decoded from the signed cookie.
///
/// Extraction is total: a missing, tampered, stale, or oversized cookie
/// yields an empty cart. Handlers never see a cookie failure.
#[derive(Debug, Clone)]
pub struct SessionCart(pub Cart);

#[async_trait]
impl FromRequestParts<AppState> for SessionCart {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cart = cart_cookie_value(&parts.headers)
            .map(|raw| state.cart_codec.decode(raw))
            .unwrap_or_default();
        Ok(Self(cart))
    }
}

/// The signed-in user behind the request.
///
/// Rejects with 401 when no bearer token is present or the token does not
/// resolve to a session.
#[derive(Debug, Clone)]
pub struct SessionUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(Self(user)),
            MaybeUser(None) => Err(AppError::unauthorized("authentication required")),
        }
    }
}

/// The signed-in user, if any.
///
/// Anonymous requests and unknown or expired tokens extract as `None`;
/// only an identity backend failure rejects. A signed-in buyer must never
/// silently degrade into a guest because a session lookup failed.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(Self(None));
        };
        let user = state.identity.resolve(token).await?;
        Ok(Self(user))
    }
}

/// Client IP address.
///
/// Extracts the client IP from the `X-Forwarded-For` header (first IP),
/// or falls back to `X-Real-IP`, or localhost.
///
/// # Priority
///
/// 1. `X-Forwarded-For` (first IP in the list)
/// 2. `X-Real-IP`
/// 3. `127.0.0.1`
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_client_ip(&parts.headers)))
    }
}

/// The value of the cart cookie, if the request carries one.
fn cart_cookie_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CART_COOKIE_NAME)
        .map(|(_, value)| value)
}

/// The bearer token from the `Authorization` header, if present.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extract client IP from proxy headers.
fn extract_client_ip(headers: &HeaderMap) -> IpAddr {
    // Try X-Forwarded-For (take first IP)
    if let Some(forwarded) = headers.get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
    }

    // Try X-Real-IP
    if let Some(real_ip) = headers.get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.parse::<IpAddr>() {
                return ip;
            }
        }
    }

    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rate_limit::InMemoryRateLimiter;
    use crate::state::{AppState, CheckoutLimit};
    use axum::http::Request;
    use crust_core::checkout::{CheckoutService, PricingConfig};
    use crust_core::cookie::CartCookieCodec;
    use crust_core::gateway::PaymentGateway;
    use crust_core::store::{AddressStore, OrderStore, PaymentMethodStore};
    use crust_testing::{
        fixtures, InMemoryAddressStore, InMemoryOrderStore, InMemoryPaymentMethodStore,
        MockIdentity, RecordingGateway,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn state_with_identity() -> (AppState, MockIdentity) {
        let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
        let addresses: Arc<dyn AddressStore> = Arc::new(InMemoryAddressStore::new());
        let payment_methods: Arc<dyn PaymentMethodStore> =
            Arc::new(InMemoryPaymentMethodStore::new());
        let gateway: Arc<dyn PaymentGateway> = Arc::new(RecordingGateway::new());
        let identity = MockIdentity::new();
        let checkout = Arc::new(CheckoutService::new(
            orders.clone(),
            addresses.clone(),
            payment_methods.clone(),
            gateway.clone(),
            PricingConfig::default(),
            "http://localhost:8080/api/payments/callback",
        ));
        let state = AppState {
            orders,
            addresses,
            payment_methods,
            identity: Arc::new(identity.clone()),
            gateway,
            limiter: Arc::new(InMemoryRateLimiter::new()),
            checkout,
            cart_codec: CartCookieCodec::new("test-secret"),
            callback_token: "test-callback-token".to_string(),
            checkout_limit: CheckoutLimit {
                max_requests: 5,
                window: Duration::from_secs(60),
            },
        };
        (state, identity)
    }

    fn parts(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[tokio::test]
    async fn session_cart_decodes_a_signed_cookie() {
        let (state, _) = state_with_identity();
        let cart = fixtures::sample_cart();
        let cookie = state.cart_codec.encode(&cart);
        let req = Request::builder()
            .header("cookie", format!("{CART_COOKIE_NAME}={cookie}"))
            .body(())
            .unwrap();

        let SessionCart(decoded) =
            SessionCart::from_request_parts(&mut parts(req), &state).await.unwrap();
        assert_eq!(decoded, cart);
    }

    #[tokio::test]
    async fn session_cart_finds_its_cookie_among_others() {
        let (state, _) = state_with_identity();
        let cookie = state.cart_codec.encode(&fixtures::sample_cart());
        let req = Request::builder()
            .header(
                "cookie",
                format!("theme=dark; {CART_COOKIE_NAME}={cookie}; lang=en"),
            )
            .body(())
            .unwrap();

        let SessionCart(decoded) =
            SessionCart::from_request_parts(&mut parts(req), &state).await.unwrap();
        assert_eq!(decoded.len(), 2);
    }

    #[tokio::test]
    async fn session_cart_is_empty_without_a_cookie() {
        let (state, _) = state_with_identity();
        let req = Request::builder().body(()).unwrap();

        let SessionCart(decoded) =
            SessionCart::from_request_parts(&mut parts(req), &state).await.unwrap();
        assert!(decoded.is_empty());
    }

    #[tokio::test]
    async fn session_cart_is_empty_on_a_tampered_cookie() {
        let (state, _) = state_with_identity();
        let cookie = state.cart_codec.encode(&fixtures::sample_cart());
        let req = Request::builder()
            .header("cookie", format!("{CART_COOKIE_NAME}=X{cookie}"))
            .body(())
            .unwrap();

        let SessionCart(decoded) =
            SessionCart::from_request_parts(&mut parts(req), &state).await.unwrap();
        assert!(decoded.is_empty());
    }

    #[tokio::test]
    async fn session_user_resolves_a_registered_token() {
        let (state, identity) = state_with_identity();
        let user = fixtures::test_user();
        identity.insert("tok-123", user.clone());
        let req = Request::builder()
            .header("authorization", "Bearer tok-123")
            .body(())
            .unwrap();

        let SessionUser(resolved) =
            SessionUser::from_request_parts(&mut parts(req), &state).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn session_user_rejects_missing_and_unknown_tokens() {
        let (state, _) = state_with_identity();

        let bare = Request::builder().body(()).unwrap();
        let err = SessionUser::from_request_parts(&mut parts(bare), &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);

        let unknown = Request::builder()
            .header("authorization", "Bearer nope")
            .body(())
            .unwrap();
        let err = SessionUser::from_request_parts(&mut parts(unknown), &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn maybe_user_treats_anonymous_and_unknown_as_guest() {
        let (state, identity) = state_with_identity();
        identity.insert("tok-123", fixtures::test_user());

        let bare = Request::builder().body(()).unwrap();
        let MaybeUser(user) = MaybeUser::from_request_parts(&mut parts(bare), &state)
            .await
            .unwrap();
        assert!(user.is_none());

        let unknown = Request::builder()
            .header("authorization", "Bearer expired")
            .body(())
            .unwrap();
        let MaybeUser(user) = MaybeUser::from_request_parts(&mut parts(unknown), &state)
            .await
            .unwrap();
        assert!(user.is_none());

        let known = Request::builder()
            .header("authorization", "Bearer tok-123")
            .body(())
            .unwrap();
        let MaybeUser(user) = MaybeUser::from_request_parts(&mut parts(known), &state)
            .await
            .unwrap();
        assert!(user.is_some());
    }

    #[test]
    fn bearer_token_requires_the_scheme_and_a_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Bearer tok-123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok-123"));

        headers.insert("authorization", "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Bearer   ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn client_ip_prefers_forwarded_for() {
        let req = Request::builder()
            .header("X-Forwarded-For", "203.0.113.1, 198.51.100.1")
            .header("X-Real-IP", "198.51.100.42")
            .body(())
            .unwrap();

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts(req), &())
            .await
            .unwrap();
        assert_eq!(ip.to_string(), "203.0.113.1");
    }

    #[tokio::test]
    async fn client_ip_falls_back_to_real_ip_then_localhost() {
        let real = Request::builder()
            .header("X-Real-IP", "198.51.100.42")
            .body(())
            .unwrap();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts(real), &())
            .await
            .unwrap();
        assert_eq!(ip.to_string(), "198.51.100.42");

        let bare = Request::builder().body(()).unwrap();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts(bare), &())
            .await
            .unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}
