//! In-process sliding-window rate limiter.
//!
//! Default implementation of the [`RateLimiter`] capability: a mutex-held
//! map from key to recent hit timestamps. State lives in the process, so
//! limits apply per instance; deployments running several replicas can put
//! a shared store behind the same trait instead.

use crust_core::limiter::RateLimiter;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Sliding-window limiter keyed by arbitrary strings.
///
/// Keys are typically `user:<id>` or `ip:<addr>`. A hit that would exceed
/// the limit is rejected without being recorded, so a blocked caller does
/// not extend their own penalty by retrying.
#[derive(Debug, Default)]
pub struct InMemoryRateLimiter {
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl InMemoryRateLimiter {
    /// Creates a limiter with no recorded hits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all recorded hits (for test isolation).
    pub fn clear(&self) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            let now = Instant::now();
            let mut attempts = self
                .attempts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let hits = attempts.entry(key).or_default();

            hits.retain(|hit| now.duration_since(*hit) < window);

            if hits.len() >= max_requests as usize {
                return false;
            }
            hits.push(now);
            true
        })
    }
}
