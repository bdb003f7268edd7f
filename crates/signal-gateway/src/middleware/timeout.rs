//! Request timeout middleware.
//!
//! Bounds the whole request by `REQUEST_TIMEOUT_SECONDS`. A request that
//! runs out of time gets the same `{"code", "message"}` body as every other
//! failure instead of an empty 408.

use crate::errors::SignalError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Duration;

/// Run the rest of the stack under `timeout`.
///
/// # Response
///
/// - Returns 408 Request Timeout with a JSON body once `timeout` elapses
/// - Otherwise passes the inner response through unchanged
pub async fn request_timeout(
    State(timeout): State<Duration>,
    request: Request,
    next: Next,
) -> Result<Response, SignalError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tokio::time::timeout(timeout, next.run(request))
        .await
        .map_err(|_| {
            tracing::warn!(
                target: "signal.middleware.timeout",
                method = %method,
                path = %path,
                timeout_ms = timeout.as_millis() as u64,
                "Request timed out"
            );
            SignalError::RequestTimeout
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(60)).await;
        "late"
    }

    async fn fast() -> &'static str {
        "OK"
    }

    fn test_app() -> Router {
        Router::new()
            .route("/slow", get(slow))
            .route("/fast", get(fast))
            .layer(middleware::from_fn_with_state(
                Duration::from_secs(5),
                request_timeout,
            ))
    }

    fn get_request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_gets_json_408() {
        let response = test_app().oneshot(get_request("/slow")).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], 408);
        assert_eq!(json["message"], "request timed out");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_request_passes_through() {
        let response = test_app().oneshot(get_request("/fast")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }
}
