//! Error types for web handlers.
//!
//! This module defines the error type every handler returns, bridging the
//! domain errors to HTTP responses via Axum's `IntoResponse` trait. The
//! conversions encode the reporting policy in one place:
//!
//! - validation failures keep their field-keyed messages,
//! - ownership mismatches read exactly like missing records, so another
//!   user's data is never confirmed to exist,
//! - infrastructure failures collapse into a generic message with the
//!   detail kept server-side in the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crust_core::cart::CartError;
use crust_core::checkout::{CheckoutError, FieldErrors};
use crust_core::gateway::GatewayError;
use crust_core::store::StoreError;
use serde::Serialize;
use std::fmt;

/// What clients see whenever the real cause stays server-side.
const GENERIC_FAILURE: &str = "something went wrong, please try again";

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Order>, AppError> {
///     let order = state.orders.get(id).await?
///         .ok_or_else(|| AppError::not_found("Order", id))?;
///     Ok(Json(order))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Field-keyed detail, present on validation failures
    errors: Option<FieldErrors>,
    /// Internal error (for logging, not exposed to clients)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            errors: None,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    ///
    /// The message names the resource kind and the id the caller already
    /// holds; it never distinguishes a foreign record from a missing one.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            message.into(),
            "CONFLICT".to_string(),
        )
    }

    /// Create a 422 Unprocessable Entity error carrying field detail.
    #[must_use]
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "one or more fields are invalid".to_string(),
            code: "VALIDATION_ERROR".to_string(),
            errors: Some(errors),
            source: None,
        }
    }

    /// Create a 500 Internal Server Error with the generic client message.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            GENERIC_FAILURE.to_string(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field-keyed detail, when this is a validation failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        self.errors.as_ref()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
    /// Field-keyed validation detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors with their hidden cause
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = %self.code,
                message = %self.message,
                source = ?self.source,
                "Internal server error"
            );
        } else {
            tracing::debug!(
                status = %self.status,
                code = %self.code,
                message = %self.message,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            errors: self.errors,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            // Foreign and missing records share one message on purpose.
            StoreError::NotFound => Self::new(
                StatusCode::NOT_FOUND,
                "record not found".to_string(),
                "NOT_FOUND".to_string(),
            ),
            StoreError::NotPermitted => Self::new(
                StatusCode::FORBIDDEN,
                "operation not permitted".to_string(),
                "FORBIDDEN".to_string(),
            ),
            StoreError::InvalidTransition { .. } => Self::conflict(error.to_string()),
            StoreError::AlreadyLinked => {
                Self::conflict("order is already linked to an account")
            }
            StoreError::Database(detail) => Self::internal().with_source(anyhow::anyhow!(detail)),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(error: CheckoutError) -> Self {
        match error {
            CheckoutError::Validation(errors) => Self::validation(errors),
            CheckoutError::EmptyCart => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "cart is empty".to_string(),
                "EMPTY_CART".to_string(),
            ),
            CheckoutError::Storage(store) => store.into(),
        }
    }
}

impl From<CartError> for AppError {
    fn from(error: CartError) -> Self {
        let errors = match &error {
            CartError::CartFull => FieldErrors::single("items", error.to_string()),
            CartError::InvalidItem(message) => FieldErrors::single("item", message.clone()),
        };
        Self::validation(errors)
    }
}

impl From<GatewayError> for AppError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Rejected { reason } => Self::new(
                StatusCode::BAD_GATEWAY,
                format!("payment provider declined: {reason}"),
                "PAYMENT_REJECTED".to_string(),
            ),
            GatewayError::Transport(detail) => {
                Self::unavailable("payment provider is unreachable")
                    .with_source(anyhow::anyhow!(detail))
            }
            GatewayError::InvalidResponse(detail) => Self::new(
                StatusCode::BAD_GATEWAY,
                "unexpected response from payment provider".to_string(),
                "GATEWAY_ERROR".to_string(),
            )
            .with_source(anyhow::anyhow!(detail)),
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal().with_source(err)
    }
}
