//! Request-id middleware.
//!
//! Every request gets a UUID: taken from the `X-Request-Id` header when
//! the caller sends a valid one, generated otherwise. The id is stored in
//! the request extensions, stamped onto a tracing span wrapping the whole
//! request, and echoed back on the response, so one id ties together the
//! client log, the server log, and the payment provider's callback
//! delivery reports.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Request id stored in the request extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

/// Middleware function for request-id tracking.
///
/// Install with `axum::middleware::from_fn(request_id)`.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    req.extensions_mut().insert(RequestId(id));

    let span = tracing::info_span!(
        "http_request",
        request_id = %id,
        method = %req.method(),
        uri = %req.uri(),
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id))
    }

    #[tokio::test]
    async fn generates_an_id_when_none_is_sent() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        let header = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn preserves_a_valid_caller_id() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, id.to_string())
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        let header = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert_eq!(header.to_str().unwrap(), id.to_string());
    }

    #[tokio::test]
    async fn replaces_an_invalid_caller_id() {
        let request = Request::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        let header = response.headers().get(REQUEST_ID_HEADER).unwrap();
        let value = header.to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
        assert_ne!(value, "not-a-uuid");
    }

    #[tokio::test]
    async fn handlers_see_the_id_in_extensions() {
        let id = Uuid::new_v4();
        let router = Router::new()
            .route(
                "/test",
                get(|Extension(RequestId(id)): Extension<RequestId>| async move {
                    id.to_string()
                }),
            )
            .layer(axum::middleware::from_fn(request_id));

        let request = Request::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, id.to_string())
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), 200);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(bytes, id.to_string().as_bytes());
    }
}
