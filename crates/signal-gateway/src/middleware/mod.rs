//! Middleware for the Signal Gateway.
//!
//! # Components
//!
//! - `auth` - Access token verification for the signaling routes
//! - `http_metrics` - HTTP request metrics middleware
//! - `timeout` - Whole-request timeout rendered as a JSON 408

pub mod auth;
pub mod http_metrics;
pub mod timeout;

pub use auth::{attach_grants, AuthState};
pub use http_metrics::http_metrics_middleware;
pub use timeout::request_timeout;
