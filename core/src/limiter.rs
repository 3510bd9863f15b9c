//! Injected rate-limiting capability.
//!
//! Checkout is the one endpoint worth abusing (it triggers outbound
//! payment calls), so the web layer gates it behind this trait. The
//! default implementation is an in-process sliding window; deployments
//! with more than one instance can plug an external store behind the same
//! trait without touching the call sites.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Sliding-window rate limiting.
///
/// # Dyn Compatibility
///
/// Boxed futures for `Arc<dyn RateLimiter>` usage.
pub trait RateLimiter: Send + Sync {
    /// Records a hit for `key` and reports whether it is within
    /// `max_requests` per `window`. Disallowed hits are not recorded, so
    /// a blocked caller does not extend their own penalty.
    fn check(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}
