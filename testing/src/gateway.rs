//! Scriptable payment gateway double.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after another panic

use crust_core::gateway::{
    GatewayError, GatewayResult, InitiateReceipt, PaymentGateway, PaymentRequest, StatusReceipt,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

/// How the gateway double should answer `initiate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayScript {
    /// Accept the charge and report it as pending approval
    Accept,
    /// Refuse the charge with the given reason
    Reject(String),
    /// Fail with a transport error before reaching the provider
    Unreachable(String),
}

/// Payment gateway double that records every request it receives.
///
/// By default every charge is accepted. Tests script failures with
/// [`RecordingGateway::script`] and inspect the captured traffic with
/// [`RecordingGateway::requests`]. Clones share state.
#[derive(Clone, Debug)]
pub struct RecordingGateway {
    script: Arc<RwLock<GatewayScript>>,
    requests: Arc<RwLock<Vec<PaymentRequest>>>,
    transaction_status: Arc<RwLock<String>>,
}

impl RecordingGateway {
    /// Creates a gateway that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Arc::new(RwLock::new(GatewayScript::Accept)),
            requests: Arc::new(RwLock::new(Vec::new())),
            transaction_status: Arc::new(RwLock::new("pending".to_string())),
        }
    }

    /// Scripts the outcome of subsequent `initiate` calls.
    pub fn script(&self, script: GatewayScript) {
        *self.script.write().unwrap() = script;
    }

    /// Sets the status `check_status` reports.
    pub fn set_transaction_status(&self, status: impl Into<String>) {
        *self.transaction_status.write().unwrap() = status.into();
    }

    /// Every request `initiate` has received, in order. Rejected and
    /// failed attempts are recorded too.
    #[must_use]
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.read().unwrap().clone()
    }

    /// Whether `initiate` was never called.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.read().unwrap().is_empty()
    }

    /// Forgets recorded traffic (for test isolation).
    pub fn clear(&self) {
        self.requests.write().unwrap().clear();
    }
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentGateway for RecordingGateway {
    fn initiate(
        &self,
        request: &PaymentRequest,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<InitiateReceipt>> + Send>> {
        let sequence = {
            let mut requests = self.requests.write().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        let script = self.script.read().unwrap().clone();
        Box::pin(async move {
            match script {
                GatewayScript::Accept => Ok(InitiateReceipt {
                    status: "pending".to_string(),
                    transaction_id: Some(format!("txn_test_{sequence}")),
                }),
                GatewayScript::Reject(reason) => Err(GatewayError::Rejected { reason }),
                GatewayScript::Unreachable(message) => Err(GatewayError::Transport(message)),
            }
        })
    }

    fn check_status(
        &self,
        reference: &str,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<StatusReceipt>> + Send>> {
        let status = self.transaction_status.read().unwrap().clone();
        let reference = reference.to_string();
        Box::pin(async move {
            Ok(StatusReceipt {
                transaction_status: status,
                transaction_id: Some(format!("txn_test_{reference}")),
            })
        })
    }
}
