//! HTTP metrics middleware.
//!
//! Records every response, including those produced before a handler runs
//! (405 for a wrong verb on `/rtc/v2`, 404 for unknown paths, 401 from the
//! auth layer, 408 from the timeout layer).

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Record method, normalized path, status and duration for the request.
///
/// Applied as the outermost layer.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::{patch, post},
        Router,
    };
    use tower::ServiceExt;

    async fn accepted() -> &'static str {
        "OK"
    }

    async fn unauthorized() -> (StatusCode, &'static str) {
        (StatusCode::UNAUTHORIZED, "permissions denied")
    }

    fn test_app() -> Router {
        Router::new()
            .route("/rtc/v2", post(accepted))
            .route("/rtc/v2/:participant_id", patch(unauthorized))
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    async fn status_for(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builder should succeed");

        test_app()
            .oneshot(request)
            .await
            .expect("request should succeed")
            .status()
    }

    #[tokio::test]
    async fn test_middleware_passes_success_through() {
        assert_eq!(status_for("POST", "/rtc/v2").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_passes_handler_error_through() {
        assert_eq!(
            status_for("PATCH", "/rtc/v2/PA_1").await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_middleware_sees_framework_errors() {
        assert_eq!(
            status_for("GET", "/rtc/v2").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(status_for("GET", "/nonexistent").await, StatusCode::NOT_FOUND);
    }
}
