//! HTTP routes for the Signal Gateway.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{attach_grants, http_metrics_middleware, request_timeout, AuthState};
use crate::services::SignalingGateway;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Connect router and participant relay.
    pub gateway: Arc<SignalingGateway>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK")
/// - `/metrics` - Prometheus metrics endpoint
/// - `POST /rtc/v2` - Connect
/// - `PATCH /rtc/v2/:participant_id` - Participant action
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - Request timeout from `REQUEST_TIMEOUT_SECONDS`, answered as a JSON 408
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let verifier = Arc::new(TokenVerifier::new(
        &state.config.api_key,
        &state.config.api_secret,
        state.config.jwt_clock_skew_seconds,
    ));
    let auth_state = Arc::new(AuthState { verifier });
    let request_timeout_budget = state.config.request_timeout();

    let public_routes = Router::new().route("/health", get(handlers::health_check));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Grants are optional here; the handlers decide what a missing token means.
    let signaling_routes = Router::new()
        .route("/rtc/v2", post(handlers::connect))
        .route("/rtc/v2/:participant_id", patch(handlers::participant_action))
        .route_layer(middleware::from_fn_with_state(auth_state, attach_grants))
        .with_state(state);

    // Layer order (last added runs first):
    // 1. TraceLayer (innermost)
    // 2. request_timeout
    // 3. http_metrics_middleware (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(signaling_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(
            request_timeout_budget,
            request_timeout,
        ))
        .layer(middleware::from_fn(http_metrics_middleware))
}
