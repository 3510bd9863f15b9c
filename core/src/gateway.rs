//! Payment gateway contract, plus a mock for development and testing.
//!
//! The real client (an HTTP integration with a mobile-money aggregator)
//! lives in `crust-gateway`; checkout only sees this trait, so the mock
//! and the real client are interchangeable and the orchestration logic is
//! identical against both.

use crate::types::Money;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors from the payment gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The provider refused the charge
    #[error("payment rejected: {reason}")]
    Rejected {
        /// Provider-supplied reason
        reason: String,
    },

    /// The gateway could not be reached or timed out
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// The gateway answered with something unintelligible
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

/// A push-payment request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Merchant-side reference, unique per charge; the order id is used
    pub reference: String,
    /// Amount to collect
    pub amount: Money,
    /// Customer name shown in the payment prompt
    pub customer_name: String,
    /// Wallet number in international form (`233…`)
    pub msisdn: String,
    /// Line shown on the customer's statement
    pub description: String,
    /// Where the gateway should deliver the payment outcome
    pub callback_url: String,
}

/// Acknowledgement of an initiated charge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitiateReceipt {
    /// Gateway-side state of the charge (`"pending"` until the customer
    /// approves on their handset)
    pub status: String,
    /// Gateway transaction id, when one was assigned
    pub transaction_id: Option<String>,
}

/// Result of a status enquiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReceipt {
    /// Gateway-side state of the transaction
    pub transaction_status: String,
    /// Gateway transaction id, when one was assigned
    pub transaction_id: Option<String>,
}

/// Payment gateway trait
///
/// Abstraction over mobile-money aggregators. Phone numbers must already
/// be normalized to the international form before calling.
pub trait PaymentGateway: Send + Sync {
    /// Initiates a push payment: the customer gets an approve/deny prompt
    /// on their handset, and the outcome arrives later via callback.
    ///
    /// # Errors
    ///
    /// Returns error if the charge could not be initiated.
    fn initiate(
        &self,
        request: &PaymentRequest,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<InitiateReceipt>> + Send>>;

    /// Looks up the current state of a previously initiated charge.
    ///
    /// # Errors
    ///
    /// Returns error if the enquiry fails.
    fn check_status(
        &self,
        reference: &str,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<StatusReceipt>> + Send>>;
}

/// Mock payment gateway (always succeeds for development)
///
/// Every initiation is acknowledged as pending and every status enquiry
/// reports success. Swap in the HTTP client from `crust-gateway` for real
/// deployments.
#[derive(Clone, Debug)]
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    /// Creates a new mock payment gateway
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new())
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn initiate(
        &self,
        request: &PaymentRequest,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<InitiateReceipt>> + Send>> {
        let reference = request.reference.clone();
        let amount = request.amount;
        Box::pin(async move {
            // Simulate network delay
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

            let transaction_id = format!("mock_txn_{}", uuid::Uuid::new_v4());

            tracing::info!(
                reference = %reference,
                amount = amount.pesewas(),
                transaction_id = %transaction_id,
                "Mock payment initiated"
            );

            Ok(InitiateReceipt {
                status: "pending".to_string(),
                transaction_id: Some(transaction_id),
            })
        })
    }

    fn check_status(
        &self,
        reference: &str,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<StatusReceipt>> + Send>> {
        let reference = reference.to_string();
        Box::pin(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

            tracing::info!(reference = %reference, "Mock status enquiry");

            Ok(StatusReceipt {
                transaction_status: "success".to_string(),
                transaction_id: Some(format!("mock_txn_{reference}")),
            })
        })
    }
}
