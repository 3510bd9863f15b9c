//! Identity collaborator seam.
//!
//! Sign-in, OTP verification, and social login live in a separate system.
//! This subsystem only ever asks one question: given a bearer token, who is
//! acting? Implementations resolve the token against their session storage;
//! callers treat `None` as an anonymous (guest) request.

use crate::store::StoreError;
use crate::types::CurrentUser;
use std::future::Future;
use std::pin::Pin;

/// Resolves bearer tokens to users.
///
/// # Dyn Compatibility
///
/// Boxed futures for `Arc<dyn Identity>` usage.
pub trait Identity: Send + Sync {
    /// Resolves a bearer token. `None` means the token is unknown or
    /// expired, which callers treat as a guest.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] when the session backend is unreachable.
    fn resolve(
        &self,
        token: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<CurrentUser>, StoreError>> + Send + '_>>;
}
