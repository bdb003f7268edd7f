//! Signal Gateway Service Library
//!
//! Stateless HTTP front for real-time session signaling. Clients establish a
//! session with `POST /rtc/v2` and send in-session messages with
//! `PATCH /rtc/v2/:participant_id`; the gateway authenticates each request,
//! validates it, and relays it over the signal bus to the node hosting the
//! room. Nothing about a session is kept between requests.
//!
//! # Modules
//!
//! - [`auth`] - Access token grants and verification
//! - [`config`] - Service configuration from environment
//! - [`context`] - Per-request context (grants, client address, deadline)
//! - [`errors`] - Error types and their HTTP mapping
//! - [`handlers`] - HTTP handlers
//! - [`middleware`] - Auth and HTTP metrics middleware
//! - [`observability`] - Prometheus metrics
//! - [`routes`] - Router and application state
//! - [`services`] - Connect Router, Participant Relay and the signal bus client

pub mod auth;
pub mod config;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod services;
