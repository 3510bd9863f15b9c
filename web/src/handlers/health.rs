//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use crust_core::types::UserId;
use serde::Serialize;
use uuid::Uuid;

/// Liveness response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving
    pub status: &'static str,
    /// Crate version baked in at build time
    pub version: &'static str,
}

/// Readiness response body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Whether the service can take traffic
    pub ready: bool,
    /// State of the database dependency
    pub database: &'static str,
}

/// Simple liveness check.
///
/// Returns 200 OK to indicate the process is running. Does NOT check
/// dependencies; see [`ready`] for that.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check that touches the database.
///
/// Runs a trivial query through the order store; 503 when it fails, so
/// the load balancer stops routing here until the database is back.
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    // The nil user owns nothing; the query only proves the store answers.
    let probe = state
        .orders
        .list_for_user(UserId::from_uuid(Uuid::nil()))
        .await;

    match probe {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                database: "up",
            }),
        ),
        Err(error) => {
            tracing::warn!(%error, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    database: "down",
                }),
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn liveness_reports_ok_and_version() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
