//! Mobile-money aggregator client.

use crust_core::gateway::{
    GatewayError, GatewayResult, InitiateReceipt, PaymentGateway, PaymentRequest, StatusReceipt,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Currency code sent with every charge. Amounts are in minor units
/// (pesewas).
const CURRENCY: &str = "GHS";

/// HTTP [`PaymentGateway`] implementation.
#[derive(Clone)]
pub struct HttpMomoGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpMomoGateway {
    /// Creates a client against `base_url`, authenticating every call
    /// with `api_key` as a bearer token.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Transport`] when the underlying HTTP client cannot
    /// be built (TLS backend initialization).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn charges_url(&self) -> String {
        format!("{}/v1/charges", self.base_url)
    }

    fn charge_url(&self, reference: &str) -> String {
        format!("{}/v1/charges/{reference}", self.base_url)
    }
}

impl PaymentGateway for HttpMomoGateway {
    fn initiate(
        &self,
        request: &PaymentRequest,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<InitiateReceipt>> + Send>> {
        let client = self.client.clone();
        let url = self.charges_url();
        let api_key = self.api_key.clone();
        let reference = request.reference.clone();
        let body = ChargeBody {
            reference: request.reference.clone(),
            amount: request.amount.pesewas(),
            currency: CURRENCY,
            customer_name: request.customer_name.clone(),
            msisdn: request.msisdn.clone(),
            description: request.description.clone(),
            callback_url: request.callback_url.clone(),
        };
        Box::pin(async move {
            tracing::debug!(reference = %reference, "Initiating mobile money charge");
            let response = client
                .post(&url)
                .bearer_auth(&api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
            match response.status() {
                status if status.is_success() => {
                    let reply: ChargeReply = response
                        .json()
                        .await
                        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
                    tracing::info!(
                        reference = %reference,
                        status = %reply.status,
                        transaction_id = ?reply.transaction_id,
                        "Charge initiated"
                    );
                    Ok(InitiateReceipt {
                        status: reply.status,
                        transaction_id: reply.transaction_id,
                    })
                }
                status if status.is_client_error() => {
                    let reason = rejection_reason(response).await;
                    tracing::warn!(reference = %reference, reason = %reason, "Charge rejected");
                    Err(GatewayError::Rejected { reason })
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    Err(GatewayError::Transport(format!(
                        "gateway returned {status}: {body}"
                    )))
                }
            }
        })
    }

    fn check_status(
        &self,
        reference: &str,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<StatusReceipt>> + Send>> {
        let client = self.client.clone();
        let url = self.charge_url(reference);
        let api_key = self.api_key.clone();
        let reference = reference.to_owned();
        Box::pin(async move {
            let response = client
                .get(&url)
                .bearer_auth(&api_key)
                .send()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
            match response.status() {
                status if status.is_success() => {
                    let reply: StatusReply = response
                        .json()
                        .await
                        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
                    tracing::debug!(
                        reference = %reference,
                        transaction_status = %reply.transaction_status,
                        "Charge status fetched"
                    );
                    Ok(StatusReceipt {
                        transaction_status: reply.transaction_status,
                        transaction_id: reply.transaction_id,
                    })
                }
                StatusCode::NOT_FOUND => Err(GatewayError::InvalidResponse(format!(
                    "unknown charge reference: {reference}"
                ))),
                status => {
                    let body = response.text().await.unwrap_or_default();
                    Err(GatewayError::Transport(format!(
                        "gateway returned {status}: {body}"
                    )))
                }
            }
        })
    }
}

/// Pulls the provider's reason out of a rejection body, falling back to
/// the status code when the body is not the documented shape.
async fn rejection_reason(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorReply>().await {
        Ok(ErrorReply {
            message: Some(message),
        }) => message,
        _ => format!("gateway declined with status {status}"),
    }
}

#[derive(Serialize)]
struct ChargeBody {
    reference: String,
    amount: u64,
    currency: &'static str,
    customer_name: String,
    msisdn: String,
    description: String,
    callback_url: String,
}

#[derive(Deserialize)]
struct ChargeReply {
    status: String,
    #[serde(default)]
    transaction_id: Option<String>,
}

#[derive(Deserialize)]
struct StatusReply {
    transaction_status: String,
    #[serde(default)]
    transaction_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorReply {
    #[serde(default)]
    message: Option<String>,
}
